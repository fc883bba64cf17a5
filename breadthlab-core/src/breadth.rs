//! Market breadth series.
//!
//! Breadth on a date is the fraction of tickers closing above their own
//! rolling mean, counted only over tickers whose mean is defined that date.
//! Dates with no defined mean are dropped from the series.

use crate::quantile::{ages_from_dates, weighted_quantile, Decay, QuantileError};
use crate::rolling::RollingMean;
use crate::table::PriceTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Moving-average length used by the calibrator.
pub const MA_WINDOW: usize = 50;

#[derive(Debug, Error)]
pub enum BreadthError {
    #[error("insufficient data to compute breadth series")]
    InsufficientData,

    #[error("duplicate price row for {ticker} on {date}")]
    DuplicateRow { date: NaiveDate, ticker: String },

    #[error("breadth series empty (not enough MA{window} data)")]
    EmptySeries { window: usize },

    #[error("rolling window must be >= 1")]
    InvalidWindow,
}

/// One retained date of the breadth series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreadthPoint {
    pub date: NaiveDate,
    /// `above / valid`, always within [0, 1].
    pub fraction: f64,
    /// Tickers with close strictly above their rolling mean.
    pub above: usize,
    /// Tickers with a defined rolling mean.
    pub valid: usize,
}

/// Date-ordered, non-empty breadth series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadthSeries {
    window: usize,
    points: Vec<BreadthPoint>,
}

impl BreadthSeries {
    pub fn points(&self) -> &[BreadthPoint] {
        &self.points
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.fraction).collect()
    }

    /// Quantile of the fractions, with recency decay anchored at the last date.
    pub fn quantile(&self, q: f64, decay: Decay) -> Result<f64, QuantileError> {
        let ages = ages_from_dates(&self.dates());
        weighted_quantile(&self.fractions(), &ages, q, decay)
    }
}

/// Compute the breadth series of a price table with the given MA window.
pub fn compute_breadth(table: &PriceTable, window: usize) -> Result<BreadthSeries, BreadthError> {
    let rolling = RollingMean::new(window).ok_or(BreadthError::InvalidWindow)?;
    if table.width() == 0 || table.height() == 0 {
        return Err(BreadthError::InsufficientData);
    }

    let height = table.height();
    let mut above = vec![0usize; height];
    let mut valid = vec![0usize; height];

    for (_, closes) in table.columns() {
        let means = rolling.compute(closes);
        for (i, (&close, &mean)) in closes.iter().zip(means.iter()).enumerate() {
            if mean.is_nan() {
                continue;
            }
            valid[i] += 1;
            // NaN close compares false: counted as not above.
            if close > mean {
                above[i] += 1;
            }
        }
    }

    let points: Vec<BreadthPoint> = table
        .dates()
        .iter()
        .enumerate()
        .filter_map(|(i, &date)| {
            if valid[i] == 0 {
                return None;
            }
            let fraction = above[i] as f64 / valid[i] as f64;
            fraction.is_finite().then_some(BreadthPoint {
                date,
                fraction,
                above: above[i],
                valid: valid[i],
            })
        })
        .collect();

    if points.is_empty() {
        return Err(BreadthError::EmptySeries { window });
    }

    Ok(BreadthSeries { window, points })
}
