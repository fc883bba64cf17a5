//! BreadthLab Runner: file I/O and orchestration around `breadthlab-core`.
//!
//! This crate provides:
//! - Runner configuration (TOML) and the standard project layout
//! - Price history loading from CSV or Parquet with provenance hashing
//! - Comment-tolerant policy document read/write
//! - Calibration target validation and clamping
//! - The end-to-end calibration run

pub mod calibrate;
pub mod comments;
pub mod config;
pub mod history;
pub mod policy;
pub mod targets;

pub use calibrate::{calibrate, CalibrationError, CalibrationMode, CalibrationOutcome};
pub use comments::strip_comments;
pub use config::{ConfigError, RunnerConfig};
pub use history::{
    load_csv, load_history, HistoryFormat, HistorySummary, LoadError, LoadedHistory,
    INDEX_TICKERS,
};
pub use policy::{PolicyDocument, PolicyError, PolicyLocations};
pub use targets::{CalibrationTargets, ClampBound, TargetError, ValidationNote};
