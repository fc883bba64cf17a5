//! BreadthLab CLI: calibrate the risk-off breadth floor.
//!
//! Reads the project's price history and policy file, computes the floor as
//! a (recency-weighted) quantile of MA50 market breadth, and writes it back
//! to `market_filter.risk_off_breadth_floor` unless `--dry-run` is given.
//!
//! Logs go to stderr (`RUST_LOG`, default `warn`); the result line or JSON
//! report goes to stdout.

use anyhow::{Context, Result};
use breadthlab_runner::{calibrate, CalibrationMode, CalibrationOutcome, RunnerConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "breadthlab",
    about = "Calibrate the market-filter breadth floor from price history"
)]
struct Cli {
    /// Path to a TOML runner config. Defaults to the standard project layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project root; overrides `base_dir` from the config file.
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Compute and report the floor without writing the policy file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Print the full calibration report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(base_dir) = cli.base_dir {
        config.base_dir = base_dir;
    }
    tracing::debug!(?config, "runner config");

    let mode = if cli.dry_run {
        CalibrationMode::DryRun
    } else {
        CalibrationMode::Apply
    };

    let outcome = calibrate(&config, mode).context("breadth-floor calibration failed")?;
    print_outcome(&outcome, cli.json)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &CalibrationOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!(
        "[calibrate.breadth] risk_off_breadth_floor={:.2}",
        outcome.floor
    );
    match &outcome.written_to {
        Some(path) => eprintln!("  written to {}", path.display()),
        None => eprintln!("  dry run: policy not modified"),
    }
    for note in &outcome.targets.notes {
        eprintln!("  note: {note}");
    }
    Ok(())
}
