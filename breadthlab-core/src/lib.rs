//! BreadthLab Core: price table, rolling means, breadth series, quantiles.
//!
//! This crate contains the statistical heart of the breadth-floor calibrator:
//! - Domain row type (`PriceRow`)
//! - Date × ticker price table with strict NaN for missing cells
//! - Full-window rolling means (no partial windows)
//! - Per-date breadth: fraction of tickers closing above their own mean
//! - Unweighted and half-life weighted quantiles
//!
//! Nothing in here touches the filesystem. Loading history and reading or
//! writing policy documents lives in `breadthlab-runner`.

pub mod breadth;
pub mod domain;
pub mod quantile;
pub mod rolling;
pub mod table;

pub use breadth::{compute_breadth, BreadthError, BreadthPoint, BreadthSeries, MA_WINDOW};
pub use domain::{normalize_ticker, PriceRow};
pub use quantile::{
    ages_from_dates, ages_from_positions, linear_quantile, weighted_quantile, Decay,
    QuantileError,
};
pub use rolling::RollingMean;
pub use table::PriceTable;
