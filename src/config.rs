//! Run configuration, optionally persisted as TOML.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides. Command-line flags take precedence over file values.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ink::DEFAULT_COORDINATE_SCALE;

/// Errors from configuration handling.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(oracle::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(oracle::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(oracle::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(oracle::config::invalid), help("{message}"))]
    Invalid { message: String },

    #[error("unknown oracle mode \"{name}\"")]
    #[diagnostic(
        code(oracle::config::unknown_mode),
        help("Valid modes are: lr_stroke, lr_symbol, mst_stroke, mst_symbol.")
    )]
    UnknownMode { name: String },

    #[error("{kind} directory does not exist: {path}")]
    #[diagnostic(
        code(oracle::config::missing_dir),
        help("Pass an existing directory. Nothing has been processed.")
    )]
    MissingDirectory { kind: &'static str, path: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// What to do with an ink file that has no paired ground-truth file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingGroundTruth {
    /// Log a warning, report the document, and carry on.
    #[default]
    Skip,
    /// Abort the run before anything is processed.
    Fail,
}

/// Settings for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Root under which the per-mode output directories are created.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Worker threads; 0 uses the available parallelism.
    #[serde(default)]
    pub workers: usize,
    /// Multiplier for fractional ink coordinates.
    #[serde(default = "default_coordinate_scale")]
    pub coordinate_scale: f64,
    #[serde(default)]
    pub missing_ground_truth: MissingGroundTruth,
    /// Show a progress bar on stderr.
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_coordinate_scale() -> f64 {
    DEFAULT_COORDINATE_SCALE
}
fn default_progress() -> bool {
    true
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            workers: 0,
            coordinate_scale: default_coordinate_scale(),
            missing_ground_truth: MissingGroundTruth::default(),
            progress: default_progress(),
        }
    }
}

impl OracleConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Reject values no run can use.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.coordinate_scale.is_finite() && self.coordinate_scale > 0.0) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "coordinate_scale must be a positive number, got {}",
                    self.coordinate_scale
                ),
            });
        }
        Ok(())
    }

    /// Number of worker threads to start.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
