//! Runner configuration: where the history and policy files live.
//!
//! Stored as an optional TOML file. Every field has a default matching the
//! standard project layout, so a run with no config file at all works from
//! the project root:
//!
//! ```text
//! {base_dir}/out/prices_history.csv
//! {base_dir}/out/orders/policy_overrides.json   (override, preferred)
//! {base_dir}/config/policy_overrides.json       (baseline)
//! ```

use crate::policy::PolicyLocations;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Root that relative paths below are resolved against.
    pub base_dir: PathBuf,
    /// Price history (CSV or Parquet).
    pub history_path: PathBuf,
    /// Runtime overrides file, used whenever it exists.
    pub override_policy_path: PathBuf,
    /// Baseline policy file, used when no override exists.
    pub baseline_policy_path: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            history_path: PathBuf::from("out/prices_history.csv"),
            override_policy_path: PathBuf::from("out/orders/policy_overrides.json"),
            baseline_policy_path: PathBuf::from("config/policy_overrides.json"),
        }
    }
}

impl RunnerConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Default layout rooted at `base_dir`.
    pub fn rooted_at(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn history_file(&self) -> PathBuf {
        self.resolve(&self.history_path)
    }

    pub fn policy_locations(&self) -> PolicyLocations {
        PolicyLocations::new(
            self.resolve(&self.override_policy_path),
            self.resolve(&self.baseline_policy_path),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_project_layout() {
        let cfg = RunnerConfig::rooted_at("/srv/desk");
        assert_eq!(
            cfg.history_file(),
            PathBuf::from("/srv/desk/out/prices_history.csv")
        );
        let locs = cfg.policy_locations();
        assert_eq!(
            locs.override_path(),
            Path::new("/srv/desk/out/orders/policy_overrides.json")
        );
        assert_eq!(
            locs.baseline_path(),
            Path::new("/srv/desk/config/policy_overrides.json")
        );
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: RunnerConfig = toml::from_str(
            r#"
            base_dir = "/data"
            history_path = "history/prices.parquet"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.history_file(), PathBuf::from("/data/history/prices.parquet"));
        assert_eq!(
            cfg.baseline_policy_path,
            RunnerConfig::default().baseline_policy_path
        );
    }

    #[test]
    fn absolute_paths_ignore_base_dir() {
        let cfg = RunnerConfig {
            history_path: PathBuf::from("/abs/prices.csv"),
            ..RunnerConfig::rooted_at("/data")
        };
        assert_eq!(cfg.history_file(), PathBuf::from("/abs/prices.csv"));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<RunnerConfig, _> = toml::from_str("histroy_path = \"x.csv\"");
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = RunnerConfig::from_file(Path::new("/nonexistent/breadthlab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/breadthlab.toml"));
    }
}
