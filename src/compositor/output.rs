//! Compositor output control
//!
//! The compositor owns the output lifecycle; the multi-head engine drives
//! it through this trait.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque handle of a compositor output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputHandle(pub u64);

impl fmt::Display for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output-{}", self.0)
    }
}

/// Output control errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// Handle does not name a live output
    #[error("Unknown output: {0}")]
    UnknownOutput(OutputHandle),

    /// Output could not be created
    #[error("Output creation failed: {0}")]
    CreateFailed(String),

    /// Compositor refused an operation
    #[error("{output} rejected {operation}: {reason}")]
    Rejected {
        /// Target output
        output: OutputHandle,
        /// Operation name
        operation: &'static str,
        /// Compositor's reason
        reason: String,
    },
}

/// Output lifecycle primitives provided by the compositor
///
/// All calls happen on the compositor's main loop thread.
#[cfg_attr(test, mockall::automock)]
pub trait OutputControl {
    /// Create a new (disabled) output for the named head
    fn create_output(&mut self, name: &str) -> Result<OutputHandle, OutputError>;

    /// Enable an output
    fn enable(&mut self, output: OutputHandle) -> Result<(), OutputError>;

    /// Disable an output
    fn disable(&mut self, output: OutputHandle) -> Result<(), OutputError>;

    /// Set the integer output scale (output must be disabled)
    fn set_scale(&mut self, output: OutputHandle, scale: u32) -> Result<(), OutputError>;

    /// Set the native mode (client pixel size)
    fn set_mode(&mut self, output: OutputHandle, width: u32, height: u32)
        -> Result<(), OutputError>;

    /// Set the physical size in millimeters
    fn set_physical_size(
        &mut self,
        output: OutputHandle,
        width_mm: u32,
        height_mm: u32,
    ) -> Result<(), OutputError>;

    /// Move an output in local space, notifying clients
    fn move_output(&mut self, output: OutputHandle, x: i32, y: i32) -> Result<(), OutputError>;

    /// Destroy an output
    fn destroy_output(&mut self, output: OutputHandle) -> Result<(), OutputError>;
}
