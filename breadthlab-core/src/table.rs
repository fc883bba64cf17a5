//! Date × ticker price table.
//!
//! Given rows for many tickers, pivot them onto a common date axis.
//! Cells a ticker has no row for get strict NaN (no forward-fill).

use crate::breadth::BreadthError;
use crate::domain::PriceRow;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Close prices pivoted onto a common, ascending date axis.
#[derive(Debug, Clone)]
pub struct PriceTable {
    /// The common date axis (sorted ascending, unique).
    dates: Vec<NaiveDate>,
    /// Ticker columns (sorted ascending, unique).
    tickers: Vec<String>,
    /// Column-major: `closes[col][row]`, each inner Vec has `dates.len()` cells.
    closes: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Pivot rows into a table keyed by (date, ticker).
    ///
    /// Fails with `InsufficientData` when there are no rows, and with
    /// `DuplicateRow` when a (date, ticker) cell would hold two values.
    pub fn from_rows(rows: &[PriceRow]) -> Result<Self, BreadthError> {
        let mut all_dates = BTreeSet::new();
        let mut by_ticker: BTreeMap<&str, HashMap<NaiveDate, f64>> = BTreeMap::new();

        for row in rows {
            all_dates.insert(row.date);
            let cells = by_ticker.entry(row.ticker.as_str()).or_default();
            if cells.insert(row.date, row.close).is_some() {
                return Err(BreadthError::DuplicateRow {
                    date: row.date,
                    ticker: row.ticker.clone(),
                });
            }
        }

        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
        if dates.is_empty() || by_ticker.is_empty() {
            return Err(BreadthError::InsufficientData);
        }

        let mut tickers = Vec::with_capacity(by_ticker.len());
        let mut closes = Vec::with_capacity(by_ticker.len());
        for (ticker, cells) in by_ticker {
            let column: Vec<f64> = dates
                .iter()
                .map(|date| cells.get(date).copied().unwrap_or(f64::NAN))
                .collect();
            tickers.push(ticker.to_string());
            closes.push(column);
        }

        Ok(Self {
            dates,
            tickers,
            closes,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Number of date rows.
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of ticker columns.
    pub fn width(&self) -> usize {
        self.tickers.len()
    }

    /// Close column for one ticker, aligned to `dates()`.
    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.tickers
            .binary_search_by(|t| t.as_str().cmp(ticker))
            .ok()
            .map(|idx| self.closes[idx].as_slice())
    }

    /// Iterate `(ticker, closes)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.closes.iter().map(Vec::as_slice))
    }
}
