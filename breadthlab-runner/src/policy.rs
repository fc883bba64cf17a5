//! Policy document I/O.
//!
//! The policy is a JSON object (comments tolerated) read from one of two
//! candidate files: the runtime override, if it exists, else the baseline.
//! Writes go back to whichever of the two resolves, overwriting the whole
//! file. There is no locking; two calibrations must not run against the
//! same file at once.

use crate::comments::strip_comments;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key of the object the calibrated floor is written into.
pub const MARKET_FILTER_KEY: &str = "market_filter";
/// Key of the calibrated floor inside `market_filter`.
pub const BREADTH_FLOOR_KEY: &str = "risk_off_breadth_floor";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("missing policy file: {}", .0.display())]
    MissingPolicy(PathBuf),

    #[error("read policy '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse policy '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("policy '{}' must be a JSON object at the top level", .0.display())]
    NotAnObject(PathBuf),

    #[error("write policy '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize policy: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ordered candidate locations for the policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyLocations {
    override_path: PathBuf,
    baseline_path: PathBuf,
}

impl PolicyLocations {
    pub fn new(override_path: impl Into<PathBuf>, baseline_path: impl Into<PathBuf>) -> Self {
        Self {
            override_path: override_path.into(),
            baseline_path: baseline_path.into(),
        }
    }

    pub fn override_path(&self) -> &Path {
        &self.override_path
    }

    pub fn baseline_path(&self) -> &Path {
        &self.baseline_path
    }

    /// First candidate that exists on disk.
    pub fn resolve(&self) -> Option<&Path> {
        [self.override_path.as_path(), self.baseline_path.as_path()]
            .into_iter()
            .find(|p| p.exists())
    }

    /// Where a save goes: the override if it exists, else the baseline.
    pub fn write_target(&self) -> &Path {
        if self.override_path.exists() {
            &self.override_path
        } else {
            &self.baseline_path
        }
    }
}

/// A parsed policy document and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    source: PathBuf,
    root: Map<String, Value>,
}

impl PolicyDocument {
    /// Load from the first existing candidate.
    pub fn load(locations: &PolicyLocations) -> Result<Self, PolicyError> {
        let path = locations
            .resolve()
            .ok_or_else(|| PolicyError::MissingPolicy(locations.baseline_path().to_path_buf()))?;
        Self::load_file(path)
    }

    /// Load one specific file.
    pub fn load_file(path: &Path) -> Result<Self, PolicyError> {
        let text = fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self, PolicyError> {
        let value: Value =
            serde_json::from_str(&strip_comments(text)).map_err(|source| PolicyError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        match value {
            Value::Object(root) => Ok(Self {
                source: path.to_path_buf(),
                root,
            }),
            _ => Err(PolicyError::NotAnObject(path.to_path_buf())),
        }
    }

    /// File this document was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Nested lookup by key path; `None` if any step is missing.
    pub fn get_path(&self, keys: &[&str]) -> Option<&Value> {
        let (first, rest) = keys.split_first()?;
        let mut current = self.root.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    /// Current `market_filter.risk_off_breadth_floor`, if numeric.
    pub fn breadth_floor(&self) -> Option<f64> {
        self.get_path(&[MARKET_FILTER_KEY, BREADTH_FLOOR_KEY])?
            .as_f64()
    }

    /// Set `market_filter.risk_off_breadth_floor`, creating (or replacing a
    /// non-object) `market_filter` as needed. Other keys are untouched.
    pub fn set_breadth_floor(&mut self, floor: f64) {
        let entry = self
            .root
            .entry(MARKET_FILTER_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(market_filter) = entry {
            market_filter.insert(BREADTH_FLOOR_KEY.to_string(), Value::from(floor));
        }
    }

    /// Pretty JSON (2-space indent), as written to disk.
    pub fn to_json_pretty(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Persist the whole document to the resolved write target.
    ///
    /// Returns the path written. Parent directories are created. Comments in
    /// the source file are not preserved.
    pub fn save(&self, locations: &PolicyLocations) -> Result<PathBuf, PolicyError> {
        let target = locations.write_target().to_path_buf();
        self.save_file(&target)?;
        Ok(target)
    }

    /// Persist the whole document to `path`.
    pub fn save_file(&self, path: &Path) -> Result<(), PolicyError> {
        let json = self.to_json_pretty()?;
        let write_err = |source| PolicyError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, json).map_err(write_err)
    }
}
