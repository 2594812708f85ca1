//! Checker configuration and settings

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;

/// Main checker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Upper bound on fixpoint passes in `unify`
    pub max_iterations: usize,
    pub magnitude: MagnitudeConfig,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            magnitude: MagnitudeConfig::default(),
        }
    }
}

/// Thresholds for precision-loss warnings on unit-bearing arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeConfig {
    /// Scale ratio at which `+`/`-` on matching dimensions warns
    pub additive_ratio: f64,
    /// Same, when either operand is `f32`
    pub f32_additive_ratio: f64,
    /// Assignment scale factor at or below which a value truncates to zero
    pub truncation_threshold: f64,
}

impl Default for MagnitudeConfig {
    fn default() -> Self {
        Self {
            additive_ratio: 1e12,
            f32_additive_ratio: 1e5,
            truncation_threshold: 1e-9,
        }
    }
}

impl CheckerConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e,
        })
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize { error: e })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                error: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_iterations".to_string(),
                message: "At least one unification pass is required".to_string(),
            });
        }

        let m = &self.magnitude;
        for (field, value) in [
            ("magnitude.additive_ratio", m.additive_ratio),
            ("magnitude.f32_additive_ratio", m.f32_additive_ratio),
        ] {
            if !value.is_finite() || value <= 1.0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: "Ratio must be a finite number greater than 1".to_string(),
                });
            }
        }

        if !m.truncation_threshold.is_finite() || m.truncation_threshold <= 0.0 || m.truncation_threshold >= 1.0 {
            return Err(ConfigError::Invalid {
                field: "magnitude.truncation_threshold".to_string(),
                message: "Threshold must lie strictly between 0 and 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error for {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Parse error for {path:?}: {error}")]
    Parse { path: PathBuf, error: toml::de::Error },

    #[error("Serialization error: {error}")]
    Serialize { error: toml::ser::Error },

    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: String, message: String },
}
