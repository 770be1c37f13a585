//! Configuration loading and management
//!
//! Handles parsing of the optional `taskwatch.toml` file in the data
//! directory. Everything has a default; the file only needs to exist when a
//! deployment wants different policy knobs.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::storage::CONFIG_FILE;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sweep configuration
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Notification query configuration
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Sweep-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Minutes between cycles of the recurring sweep trigger. A policy knob,
    /// not a correctness requirement: sweeps are idempotent at any interval.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Default approaching-deadline window in hours
    #[serde(default = "default_approaching_hours")]
    pub approaching_hours: i64,
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_approaching_hours() -> i64 {
    24
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            approaching_hours: default_approaching_hours(),
        }
    }
}

/// Notification query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Cap on `notify list` results
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_list_limit() -> usize {
    50
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, falling back to defaults
    /// when the file is missing or malformed
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.sweep.interval_minutes == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "sweep.interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.sweep.approaching_hours <= 0 {
            return Err(crate::error::Error::InvalidConfig(
                "sweep.approaching_hours must be positive".to_string(),
            ));
        }
        if self.notifications.list_limit == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "notifications.list_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
