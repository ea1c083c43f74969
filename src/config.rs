//! Stagegraph Configuration Module
//!
//! Persistent editor settings, stored in `~/.config/stagegraph/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`STAGEGRAPH_RANK_SPACING`, `STAGEGRAPH_ROW_SPACING`)
//! 2. Config file (`~/.config/stagegraph/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dag::LayoutConfig;
use crate::error::{Result, StageGraphError};

pub const RANK_SPACING_ENV: &str = "STAGEGRAPH_RANK_SPACING";
pub const ROW_SPACING_ENV: &str = "STAGEGRAPH_ROW_SPACING";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StageGraphConfig {
    /// Auto-layout spacing and origin
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl StageGraphConfig {
    /// Returns `~/.config/stagegraph/` on Unix, `%APPDATA%/stagegraph/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stagegraph")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error if the file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| StageGraphError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| StageGraphError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Spacing must be positive and finite, otherwise ranks collapse onto
    /// each other.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("layout.rank_spacing", self.layout.rank_spacing),
            ("layout.row_spacing", self.layout.row_spacing),
        ] {
            if !is_valid_spacing(value) {
                return Err(StageGraphError::ConfigError {
                    reason: format!("{} must be a positive number, got {}", key, value),
                });
            }
        }
        for (key, value) in [
            ("layout.origin_x", self.layout.origin_x),
            ("layout.origin_y", self.layout.origin_y),
        ] {
            if !value.is_finite() {
                return Err(StageGraphError::ConfigError {
                    reason: format!("{} must be finite, got {}", key, value),
                });
            }
        }
        Ok(())
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| StageGraphError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| StageGraphError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| StageGraphError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Unparsable or non-positive values are ignored with a warning.
    pub fn with_env(mut self) -> Self {
        if let Some(spacing) = spacing_from_env(RANK_SPACING_ENV) {
            self.layout.rank_spacing = spacing;
        }
        if let Some(spacing) = spacing_from_env(ROW_SPACING_ENV) {
            self.layout.row_spacing = spacing;
        }
        self
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }
}

fn is_valid_spacing(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn spacing_from_env(var: &str) -> Option<f64> {
    let raw = std::env::var(var).ok()?;
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if is_valid_spacing(value) => Some(value),
        _ => {
            tracing::warn!(var = var, value = %raw, "ignoring invalid spacing override");
            None
        }
    }
}
