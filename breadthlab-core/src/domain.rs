//! Source-granularity price row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close for one instrument.
///
/// `close` is NaN when the source cell was empty or not numeric; the row
/// still contributes its date to the table axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
}

impl PriceRow {
    pub fn new(date: NaiveDate, ticker: impl Into<String>, close: f64) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            close,
        }
    }
}

/// Normalize a raw ticker cell for matching: trim and upper-case.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_upper_cases_and_trims() {
        assert_eq!(normalize_ticker("  vn30 "), "VN30");
        assert_eq!(normalize_ticker("Fpt"), "FPT");
    }
}
