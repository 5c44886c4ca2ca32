//! Utility Functions and Diagnostics
//!
//! Head dumps and user-friendly error formatting.
//!
//! ## Diagnostics
//!
//! The [`diagnostics`] module renders the monitor manager state:
//!
//! ```rust
//! use lamco_rdp_multihead::config::{MultiMonitorConfig, ScalingConfig};
//! use lamco_rdp_multihead::multimon::MonitorManager;
//! use lamco_rdp_multihead::utils::format_head_dump;
//!
//! let manager = MonitorManager::new(ScalingConfig::default(), MultiMonitorConfig::default());
//! println!("{}", format_head_dump(&manager));
//! ```
//!
//! ## Error Formatting
//!
//! The [`errors`] module turns `anyhow` errors into boxed messages with
//! troubleshooting hints. Categories:
//! - Rejected topology → layout requirements
//! - Internal invariant violation → bug report hint
//! - Config errors → syntax and value ranges
//! - Layout file errors → expected JSON shape

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{format_head_dump, log_head_dump};
pub use errors::format_user_error;
