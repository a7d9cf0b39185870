//! Analysis Settings
//! Defaults mirror the measurement runs; an optional `analysis.json` overrides them.

use crate::data::ShardLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "analysis.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Everything the pipeline needs to know about inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Dataset names in report order. The first one found is the baseline.
    pub datasets: Vec<String>,
    /// Layouts probed in order; the first that yields a shard wins.
    pub layouts: Vec<ShardLayout>,
    pub output_dir: PathBuf,
    pub rolling_window: usize,
    pub rolling_min_periods: usize,
    pub histogram_bins: usize,
    /// Duration range (ms) the dashboard zooms into.
    pub dashboard_focus_ms: Option<[f64; 2]>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            datasets: vec![
                "async_ws".to_string(),
                "poll_ws".to_string(),
                "busy_poll_ws".to_string(),
            ],
            layouts: vec![
                ShardLayout::Sharded {
                    dir: PathBuf::from("temp"),
                },
                ShardLayout::Flat {
                    dir: PathBuf::from("."),
                },
            ],
            output_dir: PathBuf::from("."),
            rolling_window: 100,
            rolling_min_periods: 1,
            histogram_bins: 50,
            dashboard_focus_ms: Some([0.0, 20.0]),
        }
    }
}

impl AnalysisConfig {
    /// Read settings from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasets.is_empty() {
            return Err(ConfigError::Invalid("no datasets configured".into()));
        }
        if self.layouts.is_empty() {
            return Err(ConfigError::Invalid("no shard layouts configured".into()));
        }
        if self.rolling_window == 0 {
            return Err(ConfigError::Invalid("rolling_window must be > 0".into()));
        }
        if self.rolling_min_periods == 0 || self.rolling_min_periods > self.rolling_window {
            return Err(ConfigError::Invalid(format!(
                "rolling_min_periods must be within 1..={}",
                self.rolling_window
            )));
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::Invalid("histogram_bins must be > 0".into()));
        }
        if let Some([lo, hi]) = self.dashboard_focus_ms {
            if !(lo < hi) {
                return Err(ConfigError::Invalid(format!(
                    "dashboard_focus_ms is empty: [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }

    /// Resolve an artifact file name inside the output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
