//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::memory::DEFAULT_INTERVAL_BASE_SECS;

/// Default requested forgetting index (percent)
pub const DEFAULT_REQUESTED_FI: f64 = 10.0;

/// Default blend rate for matrix cells moving toward observed factors
pub const DEFAULT_MATRIX_LEARNING_RATE: f64 = 0.05;

/// Configuration error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field is outside its accepted range
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// JSON could not be parsed
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Process-wide scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Interval (seconds) used as elapsed time for never-reviewed items and as
    /// the reset interval after a lapse
    pub interval_base: f64,
    /// Target forgetting index in percent
    pub requested_forgetting_index: f64,
    /// How far a matrix cell moves toward each observation (0, 1]
    pub matrix_learning_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_base: DEFAULT_INTERVAL_BASE_SECS,
            requested_forgetting_index: DEFAULT_REQUESTED_FI,
            matrix_learning_rate: DEFAULT_MATRIX_LEARNING_RATE,
        }
    }
}

impl EngineConfig {
    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.interval_base.is_finite() && self.interval_base > 0.0) {
            return Err(ConfigError::Invalid {
                field: "intervalBase",
                reason: format!("must be a positive number of seconds, got {}", self.interval_base),
            });
        }
        if !(self.requested_forgetting_index > 0.0 && self.requested_forgetting_index < 100.0) {
            return Err(ConfigError::Invalid {
                field: "requestedForgettingIndex",
                reason: format!(
                    "must be a percentage in (0, 100), got {}",
                    self.requested_forgetting_index
                ),
            });
        }
        if !(self.matrix_learning_rate > 0.0 && self.matrix_learning_rate <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "matrixLearningRate",
                reason: format!("must be in (0, 1], got {}", self.matrix_learning_rate),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
