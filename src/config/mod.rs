//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

pub use types::{LoggingConfig, MultiMonitorConfig, ScalingConfig};

/// Hard protocol limit on monitors per layout
pub const MAX_MONITORS: usize = 16;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// DPI scaling configuration
    #[serde(default)]
    pub scaling: ScalingConfig,
    /// Multi-monitor configuration
    #[serde(default)]
    pub multimon: MultiMonitorConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Result<Self> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.multimon.max_monitors == 0 || self.multimon.max_monitors > MAX_MONITORS {
            anyhow::bail!(
                "Invalid max_monitors: {} (must be 1..={})",
                self.multimon.max_monitors,
                MAX_MONITORS
            );
        }

        let debug_scale = self.scaling.debug_desktop_scaling_factor;
        if debug_scale != 0 && !(100..=500).contains(&debug_scale) {
            anyhow::bail!(
                "Invalid debug_desktop_scaling_factor: {} (must be 0 or 100..=500)",
                debug_scale
            );
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, verbose: u8, debug_scale: Option<u32>) -> Self {
        match verbose {
            0 => {}
            1 => self.logging.level = "debug".to_string(),
            _ => self.logging.level = "trace".to_string(),
        }

        if let Some(scale) = debug_scale {
            self.scaling.debug_desktop_scaling_factor = scale;
        }

        self
    }
}
