//! Breadth-floor calibration run.
//!
//! Pipeline: load policy → validate targets → load history → pivot →
//! breadth series → (weighted) quantile → clamp → optionally persist.
//!
//! Targets are validated before the history is touched, so a bad policy
//! fails fast even when the history file is missing. Nothing is written
//! unless every stage succeeds.

use crate::config::RunnerConfig;
use crate::history::{load_history, HistorySummary, LoadError};
use crate::policy::{PolicyDocument, PolicyError};
use crate::targets::{CalibrationTargets, ClampBound, TargetError};
use breadthlab_core::{compute_breadth, BreadthError, PriceTable, QuantileError, MA_WINDOW};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),
    #[error("invalid calibration targets: {0}")]
    Target(#[from] TargetError),
    #[error("history error: {0}")]
    Load(#[from] LoadError),
    #[error("breadth error: {0}")]
    Breadth(#[from] BreadthError),
    #[error("quantile error: {0}")]
    Quantile(#[from] QuantileError),
}

/// Whether to persist the calibrated floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationMode {
    /// Compute and report only.
    DryRun,
    /// Compute and write the floor back into the policy file.
    #[default]
    Apply,
}

/// Result of a successful calibration.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationOutcome {
    /// Floor after clamping; the value written in apply mode.
    pub floor: f64,
    /// Quantile before clamping.
    pub raw_floor: f64,
    pub clamped_by: Option<ClampBound>,
    /// Floor present in the policy before this run, if numeric.
    pub previous_floor: Option<f64>,
    pub targets: CalibrationTargets,
    pub ma_window: usize,
    pub series_len: usize,
    pub series_start: NaiveDate,
    pub series_end: NaiveDate,
    pub policy_source: PathBuf,
    pub history: HistorySummary,
    /// File the policy was written to; `None` in dry-run mode.
    pub written_to: Option<PathBuf>,
}

/// Run one calibration against the files named by `config`.
pub fn calibrate(
    config: &RunnerConfig,
    mode: CalibrationMode,
) -> Result<CalibrationOutcome, CalibrationError> {
    let locations = config.policy_locations();
    let mut policy = PolicyDocument::load(&locations)?;
    info!(path = %policy.source().display(), "loaded policy");

    let targets = CalibrationTargets::from_policy(&policy)?;
    for note in &targets.notes {
        warn!(%note, "calibration target note");
    }
    debug!(
        q = targets.q,
        decay = ?targets.decay,
        floor_min = ?targets.floor_min,
        floor_max = ?targets.floor_max,
        "validated targets"
    );

    let history_path = config.history_file();
    let loaded = load_history(&history_path)?;
    let summary = &loaded.summary;
    info!(
        path = %history_path.display(),
        rows = summary.rows,
        tickers = summary.tickers,
        dropped = summary.dropped_unparseable,
        excluded_index = summary.excluded_index,
        hash = %summary.dataset_hash,
        "loaded price history"
    );

    if summary.dropped_unparseable > 0 {
        warn!(
            dropped = summary.dropped_unparseable,
            raw_rows = summary.raw_rows,
            "dropped history rows with unparseable date or empty ticker"
        );
    }

    let table = PriceTable::from_rows(&loaded.rows)?;
    let series = compute_breadth(&table, MA_WINDOW)?;
    debug!(
        points = series.len(),
        start = %series.first_date(),
        end = %series.last_date(),
        "computed breadth series"
    );

    let raw_floor = series.quantile(targets.q, targets.decay)?;
    let (floor, clamped_by) = targets.clamp(raw_floor);
    if let Some(bound) = clamped_by {
        info!(raw_floor, floor, ?bound, "floor clamped");
    }

    let previous_floor = policy.breadth_floor();
    let written_to = match mode {
        CalibrationMode::DryRun => None,
        CalibrationMode::Apply => {
            policy.set_breadth_floor(floor);
            let path = policy.save(&locations)?;
            info!(path = %path.display(), floor, "wrote breadth floor");
            Some(path)
        }
    };

    Ok(CalibrationOutcome {
        floor,
        raw_floor,
        clamped_by,
        previous_floor,
        ma_window: series.window(),
        series_len: series.len(),
        series_start: series.first_date(),
        series_end: series.last_date(),
        policy_source: policy.source().to_path_buf(),
        history: loaded.summary,
        targets,
        written_to,
    })
}
