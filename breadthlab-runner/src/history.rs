//! Price history loading for breadth calibration.
//!
//! Reads per-ticker daily closes from a CSV or Parquet file (chosen by
//! extension) with at least the columns `Date`, `Ticker`, `Close`. Extra
//! columns are ignored. The loader fails fast on anything structural:
//! 1. File absent → `MissingSource`
//! 2. Required column absent → `MissingColumns` (all of them, sorted)
//! 3. No row with a parseable date and a ticker → `NoParseableRows`
//! 4. No row left after dropping index tickers → `NoNonIndexRows`
//!
//! Close cells that are empty, not numeric, or not finite become NaN; the
//! row keeps its date so the table axis is unchanged.

use breadthlab_core::{normalize_ticker, PriceRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Aggregate index tickers excluded from breadth.
pub const INDEX_TICKERS: [&str; 3] = ["VNINDEX", "VN30", "VN100"];

pub const DATE_COLUMN: &str = "Date";
pub const TICKER_COLUMN: &str = "Ticker";
pub const CLOSE_COLUMN: &str = "Close";

const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, TICKER_COLUMN, CLOSE_COLUMN];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing price history '{}' for breadth calibration", .0.display())]
    MissingSource(PathBuf),

    #[error("price history '{}' missing columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("price history '{}' has no rows with a parseable date and ticker", .0.display())]
    NoParseableRows(PathBuf),

    #[error("no non-index tickers in history '{}' for breadth calibration", .0.display())]
    NoNonIndexRows(PathBuf),

    #[error("read CSV '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("parquet I/O error in '{}': {reason}", .path.display())]
    Parquet { path: PathBuf, reason: String },

    #[error("open '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// On-disk format of the history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryFormat {
    Csv,
    Parquet,
}

impl HistoryFormat {
    /// `.parquet` → Parquet, anything else → CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => HistoryFormat::Parquet,
            _ => HistoryFormat::Csv,
        }
    }
}

/// What the loader kept and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub source: PathBuf,
    pub format: HistoryFormat,
    /// Data rows in the file.
    pub raw_rows: usize,
    /// Rows dropped for an unparseable date or empty ticker.
    pub dropped_unparseable: usize,
    /// Rows dropped because the ticker is an index.
    pub excluded_index: usize,
    /// Rows retained.
    pub rows: usize,
    /// Distinct retained tickers.
    pub tickers: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// BLAKE3 over retained rows in (date, ticker) order.
    pub dataset_hash: String,
}

/// Validated rows plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedHistory {
    /// Sorted by (date, ticker).
    pub rows: Vec<PriceRow>,
    pub summary: HistorySummary,
}

/// A data row before validation: date parsed if possible, ticker raw.
#[derive(Debug, Clone)]
struct RawRecord {
    date: Option<NaiveDate>,
    ticker: String,
    close: f64,
}

/// Load and validate price history from `path`.
pub fn load_history(path: &Path) -> Result<LoadedHistory, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingSource(path.to_path_buf()));
    }
    let format = HistoryFormat::from_path(path);
    let records = match format {
        HistoryFormat::Csv => {
            let file = fs::File::open(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            read_csv_records(file, path)?
        }
        HistoryFormat::Parquet => read_parquet_records(path)?,
    };
    finish(records, path, format)
}

/// Load and validate CSV history from any reader. `source` only labels errors.
pub fn load_csv<R: Read>(reader: R, source: &Path) -> Result<LoadedHistory, LoadError> {
    let records = read_csv_records(reader, source)?;
    finish(records, source, HistoryFormat::Csv)
}

fn missing_columns(path: &Path, present: &[String]) -> Result<(), LoadError> {
    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.iter().any(|p| p.as_str() == **c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(LoadError::MissingColumns {
        path: path.to_path_buf(),
        columns: missing,
    })
}

fn read_csv_records<R: Read>(reader: R, path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    missing_columns(path, &headers)?;

    let index_of = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (date_idx, ticker_idx, close_idx) = (
        index_of(DATE_COLUMN),
        index_of(TICKER_COLUMN),
        index_of(CLOSE_COLUMN),
    );

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        records.push(RawRecord {
            date: record.get(date_idx).and_then(parse_date),
            ticker: record.get(ticker_idx).unwrap_or_default().to_string(),
            close: record.get(close_idx).map_or(f64::NAN, parse_close),
        });
    }
    Ok(records)
}

fn read_parquet_records(path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    let pq_err = |reason: String| LoadError::Parquet {
        path: path.to_path_buf(),
        reason,
    };

    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| pq_err(format!("read: {e}")))?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    missing_columns(path, &names)?;

    let n = df.height();
    let column = |name: &str| df.column(name).map_err(|e| pq_err(format!("column {name}: {e}")));

    let dates = parquet_dates(column(DATE_COLUMN)?, n).map_err(|e| pq_err(format!("Date: {e}")))?;

    let tickers = column(TICKER_COLUMN)?
        .cast(&DataType::String)
        .map_err(|e| pq_err(format!("Ticker cast: {e}")))?;
    let ticker_ca = tickers
        .str()
        .map_err(|e| pq_err(format!("Ticker column type: {e}")))?;

    let closes = column(CLOSE_COLUMN)?
        .cast(&DataType::Float64)
        .map_err(|e| pq_err(format!("Close cast: {e}")))?;
    let close_ca = closes
        .f64()
        .map_err(|e| pq_err(format!("Close column type: {e}")))?;

    let records = (0..n)
        .map(|i| RawRecord {
            date: dates[i],
            ticker: ticker_ca.get(i).unwrap_or_default().to_string(),
            close: close_ca
                .get(i)
                .filter(|c| c.is_finite())
                .unwrap_or(f64::NAN),
        })
        .collect();
    Ok(records)
}

/// Dates from a native Date/Datetime column, or parsed from strings.
fn parquet_dates(col: &Column, n: usize) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    match col.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let as_date = col.cast(&DataType::Date)?;
            let ca = as_date.date()?;
            Ok((0..n)
                .map(|i| {
                    ca.get(i)
                        .map(|days| epoch + chrono::Duration::days(days as i64))
                })
                .collect())
        }
        _ => {
            let as_str = col.cast(&DataType::String)?;
            let ca = as_str.str()?;
            Ok((0..n).map(|i| ca.get(i).and_then(parse_date)).collect())
        }
    }
}

/// Parse a calendar date; any time-of-day component is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse a close cell; empty, non-numeric or non-finite → NaN.
pub fn parse_close(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite())
        .unwrap_or(f64::NAN)
}

pub fn is_index_ticker(ticker: &str) -> bool {
    INDEX_TICKERS.contains(&ticker)
}

fn finish(
    records: Vec<RawRecord>,
    path: &Path,
    format: HistoryFormat,
) -> Result<LoadedHistory, LoadError> {
    let raw_rows = records.len();

    let parsed: Vec<PriceRow> = records
        .into_iter()
        .filter_map(|r| {
            let ticker = normalize_ticker(&r.ticker);
            match r.date {
                Some(date) if !ticker.is_empty() => Some(PriceRow::new(date, ticker, r.close)),
                _ => None,
            }
        })
        .collect();
    let dropped_unparseable = raw_rows - parsed.len();
    if parsed.is_empty() {
        return Err(LoadError::NoParseableRows(path.to_path_buf()));
    }

    let parsed_rows = parsed.len();
    let mut rows: Vec<PriceRow> = parsed
        .into_iter()
        .filter(|r| !is_index_ticker(&r.ticker))
        .collect();
    let excluded_index = parsed_rows - rows.len();
    if rows.is_empty() {
        return Err(LoadError::NoNonIndexRows(path.to_path_buf()));
    }

    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));

    let tickers: BTreeSet<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    let summary = HistorySummary {
        source: path.to_path_buf(),
        format,
        raw_rows,
        dropped_unparseable,
        excluded_index,
        rows: rows.len(),
        tickers: tickers.len(),
        first_date: rows[0].date,
        last_date: rows[rows.len() - 1].date,
        dataset_hash: compute_dataset_hash(&rows),
    };

    Ok(LoadedHistory { rows, summary })
}

/// Deterministic BLAKE3 hash over rows already in (date, ticker) order.
fn compute_dataset_hash(rows: &[PriceRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        hasher.update(row.date.to_string().as_bytes());
        hasher.update(&(row.ticker.len() as u64).to_le_bytes());
        hasher.update(row.ticker.as_bytes());
        hasher.update(&row.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
