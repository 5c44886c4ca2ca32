//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-monitor DPI scaling configuration
///
/// Rules are applied in priority order: the master switch, the debug
/// override, fractional scaling, round-up, then integer truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Honor client DPI attributes at all (false = always 1.0)
    pub enable_hi_dpi_support: bool,

    /// Force this scale (percent) on every monitor (0 = disabled)
    pub debug_desktop_scaling_factor: u32,

    /// Use the client's desktop scale factor as a fractional scale
    pub enable_fractional_hi_dpi_support: bool,

    /// Round the desktop scale factor to the nearest integer scale
    pub enable_fractional_hi_dpi_roundup: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            enable_hi_dpi_support: true,
            debug_desktop_scaling_factor: 0,
            enable_fractional_hi_dpi_support: false,
            enable_fractional_hi_dpi_roundup: false,
        }
    }
}

/// Multi-monitor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiMonitorConfig {
    /// Maximum number of monitors accepted in one layout
    pub max_monitors: usize,

    /// Create compositor outputs for new heads right after each commit
    pub auto_realize_outputs: bool,
}

impl Default for MultiMonitorConfig {
    fn default() -> Self {
        Self {
            max_monitors: super::MAX_MONITORS,
            auto_realize_outputs: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Directory for log files (None = console only)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}
