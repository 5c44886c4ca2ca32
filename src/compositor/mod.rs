//! Compositor Output Interface
//!
//! The compositor's output/head lifecycle is external to the multi-head
//! engine. This module defines the seam ([`OutputControl`]) and an
//! in-memory headless implementation ([`VirtualOutputs`]).
//!
//! # Architecture
//!
//! ```text
//! MonitorManager
//!   └─> OutputControl (trait)
//!         ├─> compositor backend (embedding server)
//!         └─> VirtualOutputs (headless, replay + tests)
//! ```

pub mod output;
pub mod virtual_outputs;

pub use output::{OutputControl, OutputError, OutputHandle};
pub use virtual_outputs::{OutputCall, VirtualOutput, VirtualOutputs};

#[cfg(test)]
pub use output::MockOutputControl;
