//! Quantile estimators: unweighted and half-life weighted.
//!
//! Unweighted: sort ascending and interpolate linearly at position q·(n−1).
//!
//! Weighted: each observation gets weight exp(−λ·age) with λ = ln 2 / half-life,
//! so an observation's influence halves every half-life. Values are sorted,
//! cumulative weight is normalized to [0, 1], and the result is the
//! piecewise-linear inverse CDF evaluated at q. With uniform weights this
//! reduces to a CDF whose first knot sits at 1/n rather than 0, so the two
//! estimators coincide only in the limit of many observations.
//!
//! All functions are pure: values in, scalar out.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QuantileError {
    #[error("cannot take a quantile of an empty series")]
    EmptySeries,

    #[error("quantile level must be within [0,1], got {0}")]
    InvalidLevel(f64),

    #[error("values ({values}) and ages ({ages}) differ in length")]
    LengthMismatch { values: usize, ages: usize },

    #[error("no finite data available for quantile")]
    NoFiniteData,

    #[error("invalid weights for weighted quantile (all zero)")]
    AllWeightsZero,

    #[error("invalid cumulative weight during weighted quantile calculation: {0}")]
    InvalidTotalWeight(f64),
}

/// Recency weighting applied to a quantile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decay {
    /// Every observation weighs the same.
    Disabled,
    /// Exponential decay with the given half-life in days (> 0).
    HalfLife { days: f64 },
}

impl Decay {
    /// Non-positive or absent half-life disables decay.
    pub fn from_half_life(half_life_days: Option<f64>) -> Self {
        match half_life_days {
            Some(days) if days > 0.0 => Decay::HalfLife { days },
            _ => Decay::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Decay::HalfLife { .. })
    }

    /// λ = ln 2 / half-life; zero when disabled.
    pub fn rate(&self) -> f64 {
        match *self {
            Decay::Disabled => 0.0,
            Decay::HalfLife { days } => std::f64::consts::LN_2 / days,
        }
    }

    /// exp(−λ·age). The observation at age 0 weighs 1.
    pub fn weight(&self, age_days: f64) -> f64 {
        (-self.rate() * age_days).exp()
    }
}

/// Age of each date in days, relative to the last date.
pub fn ages_from_dates(dates: &[NaiveDate]) -> Vec<f64> {
    let Some(&last) = dates.last() else {
        return Vec::new();
    };
    dates
        .iter()
        .map(|d| (last - *d).num_days() as f64)
        .collect()
}

/// Step distance from the last position, for series without dates.
pub fn ages_from_positions(n: usize) -> Vec<f64> {
    (0..n).map(|i| (n - 1 - i) as f64).collect()
}

fn check_level(q: f64) -> Result<(), QuantileError> {
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(QuantileError::InvalidLevel(q))
    }
}

/// Unweighted q-th quantile with linear interpolation between order statistics.
///
/// Non-finite values are ignored.
pub fn linear_quantile(values: &[f64], q: f64) -> Result<f64, QuantileError> {
    check_level(q)?;
    if values.is_empty() {
        return Err(QuantileError::EmptySeries);
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Err(QuantileError::NoFiniteData);
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// q-th quantile of `values`, weighted by `decay` over `ages` (days).
///
/// With `Decay::Disabled` this is exactly [`linear_quantile`] and `ages` is
/// only checked for length.
pub fn weighted_quantile(
    values: &[f64],
    ages: &[f64],
    q: f64,
    decay: Decay,
) -> Result<f64, QuantileError> {
    check_level(q)?;
    if values.len() != ages.len() {
        return Err(QuantileError::LengthMismatch {
            values: values.len(),
            ages: ages.len(),
        });
    }
    if values.is_empty() {
        return Err(QuantileError::EmptySeries);
    }
    if !decay.is_enabled() {
        return linear_quantile(values, q);
    }

    let mut pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(ages)
        .map(|(&v, &age)| (v, decay.weight(age)))
        .filter(|(v, w)| v.is_finite() && w.is_finite())
        .collect();
    if pairs.is_empty() {
        return Err(QuantileError::NoFiniteData);
    }
    if !pairs.iter().any(|&(_, w)| w > 0.0) {
        return Err(QuantileError::AllWeightsZero);
    }

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cum = Vec::with_capacity(pairs.len());
    let mut running = 0.0;
    for &(_, w) in &pairs {
        running += w;
        cum.push(running);
    }
    let total = running;
    if !total.is_finite() || total <= 0.0 {
        return Err(QuantileError::InvalidTotalWeight(total));
    }
    for c in &mut cum {
        *c /= total;
    }

    let sorted_values: Vec<f64> = pairs.iter().map(|&(v, _)| v).collect();
    Ok(interp(q, &cum, &sorted_values))
}

/// Piecewise-linear interpolation of `fp` over ascending knots `xp`.
///
/// Clamps to the end values outside the knot range. Repeated knots are
/// skipped: the segment used is the one with `xp[j] <= x < xp[j + 1]`.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x < xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let k = xp.partition_point(|&c| c <= x);
    let j = k - 1;
    let t = (x - xp[j]) / (xp[k] - xp[j]);
    fp[j] + (fp[k] - fp[j]) * t
}
