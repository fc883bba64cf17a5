//! Calibration targets read from the policy document.
//!
//! Lives at `calibration_targets.market_filter`:
//!
//! ```json
//! "calibration_targets": {
//!   "market_filter": {
//!     "breadth_floor_q": 0.40,
//!     "breadth_floor_half_life_days": 120,
//!     "breadth_floor_min": 0.30,
//!     "breadth_floor_max": 0.55
//!   }
//! }
//! ```
//!
//! Only the quantile level is required. Values may be JSON numbers or
//! numeric strings; `null` counts as absent for the optional fields. A
//! non-positive half-life is not an error: it disables decay and is recorded
//! as a [`ValidationNote`].

use crate::policy::PolicyDocument;
use breadthlab_core::Decay;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub const TARGETS_SECTION: [&str; 2] = ["calibration_targets", "market_filter"];
pub const Q_KEY: &str = "breadth_floor_q";
pub const HALF_LIFE_KEY: &str = "breadth_floor_half_life_days";
pub const MIN_KEY: &str = "breadth_floor_min";
pub const MAX_KEY: &str = "breadth_floor_max";

#[derive(Debug, Error, PartialEq)]
pub enum TargetError {
    #[error("missing calibration_targets.market_filter.{0}")]
    MissingKey(&'static str),

    #[error("{0} must be a JSON object")]
    InvalidSection(&'static str),

    #[error("invalid {key}: {detail}")]
    NotNumeric { key: &'static str, detail: String },

    #[error("{key} must be within [0,1], got {value}")]
    OutOfRange { key: &'static str, value: f64 },

    #[error("breadth_floor_min ({min}) cannot exceed breadth_floor_max ({max})")]
    BoundsInverted { min: f64, max: f64 },
}

/// Non-fatal findings from validation, surfaced in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationNote {
    /// The configured half-life was not positive, so decay is off.
    DecayDisabled { half_life_days: f64 },
}

impl fmt::Display for ValidationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationNote::DecayDisabled { half_life_days } => write!(
                f,
                "{HALF_LIFE_KEY}={half_life_days} is not positive; recency decay disabled"
            ),
        }
    }
}

/// Which clamp bound changed the raw floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampBound {
    Min,
    Max,
}

/// Validated calibration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTargets {
    pub q: f64,
    pub decay: Decay,
    pub floor_min: Option<f64>,
    pub floor_max: Option<f64>,
    pub notes: Vec<ValidationNote>,
}

impl CalibrationTargets {
    /// Read and validate targets from a policy document.
    pub fn from_policy(policy: &PolicyDocument) -> Result<Self, TargetError> {
        let empty = Map::new();
        let section = match policy.root().get(TARGETS_SECTION[0]) {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(targets)) => match targets.get(TARGETS_SECTION[1]) {
                None | Some(Value::Null) => &empty,
                Some(Value::Object(mf)) => mf,
                Some(_) => return Err(TargetError::InvalidSection("calibration_targets.market_filter")),
            },
            Some(_) => return Err(TargetError::InvalidSection("calibration_targets")),
        };
        Self::from_section(section)
    }

    /// Validate the `market_filter` targets object itself.
    pub fn from_section(section: &Map<String, Value>) -> Result<Self, TargetError> {
        let raw_q = section.get(Q_KEY).ok_or(TargetError::MissingKey(Q_KEY))?;
        let q = numeric(Q_KEY, raw_q)?.ok_or_else(|| TargetError::NotNumeric {
            key: Q_KEY,
            detail: "null".into(),
        })?;
        check_unit(Q_KEY, q)?;

        let mut notes = Vec::new();

        let half_life = optional(section, HALF_LIFE_KEY)?;
        let decay = Decay::from_half_life(half_life);
        if let Some(h) = half_life.filter(|h| *h <= 0.0) {
            notes.push(ValidationNote::DecayDisabled { half_life_days: h });
        }

        let floor_min = optional(section, MIN_KEY)?;
        if let Some(v) = floor_min {
            check_unit(MIN_KEY, v)?;
        }
        let floor_max = optional(section, MAX_KEY)?;
        if let Some(v) = floor_max {
            check_unit(MAX_KEY, v)?;
        }

        if let (Some(min), Some(max)) = (floor_min, floor_max) {
            if min > max {
                return Err(TargetError::BoundsInverted { min, max });
            }
        }

        Ok(Self {
            q,
            decay,
            floor_min,
            floor_max,
            notes,
        })
    }

    /// `max(raw, floor_min)` then `min(_, floor_max)`, reporting the bound
    /// that changed the value.
    pub fn clamp(&self, raw: f64) -> (f64, Option<ClampBound>) {
        let mut value = raw;
        let mut bound = None;
        if let Some(min) = self.floor_min {
            if value < min {
                value = min;
                bound = Some(ClampBound::Min);
            }
        }
        if let Some(max) = self.floor_max {
            if value > max {
                value = max;
                bound = Some(ClampBound::Max);
            }
        }
        (value, bound)
    }
}

fn optional(section: &Map<String, Value>, key: &'static str) -> Result<Option<f64>, TargetError> {
    match section.get(key) {
        None => Ok(None),
        Some(v) => numeric(key, v),
    }
}

/// Number or numeric string → finite f64; `null` → None.
fn numeric(key: &'static str, value: &Value) -> Result<Option<f64>, TargetError> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        Some(v) => Err(TargetError::NotNumeric {
            key,
            detail: format!("{v} is not finite"),
        }),
        None => Err(TargetError::NotNumeric {
            key,
            detail: format!("expected a number, got {value}"),
        }),
    }
}

fn check_unit(key: &'static str, value: f64) -> Result<(), TargetError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TargetError::OutOfRange { key, value })
    }
}
