//! # lamco-rdp-multihead
//!
//! Multi-monitor reconciliation and coordinate mapping for a Wayland RDP
//! server.
//!
//! A connected client declares its monitor topology through the display
//! control channel. This crate turns that untrusted layout into a valid set
//! of compositor outputs (exactly one primary at the origin, no overlaps),
//! computes per-monitor scale factors, reuses existing outputs wherever it
//! can, and maps pointer coordinates between the client's space and the
//! compositor's.
//!
//! # Architecture
//!
//! ```text
//! lamco-rdp-multihead
//!   ├─> DisplayControlHandler (I/O side, async)
//!   │     └─> LayoutSubmitter ──queue──> DisplayLoop (compositor main loop)
//!   ├─> MonitorManager
//!   │     ├─> TopologyValidator   (primary rules, chain detection)
//!   │     ├─> ScaleResolver       (output / client scale)
//!   │     ├─> LayoutProjector     (client → local rectangles)
//!   │     └─> ReconciliationTransaction over HeadRegistry
//!   ├─> OutputControl (compositor output lifecycle, external)
//!   └─> CoordinateMapper (input path)
//! ```
//!
//! # Data Flow
//!
//! **Layout Path:** Client → DisplayControlHandler → DisplayLoop →
//! MonitorManager → OutputControl
//!
//! **Input Path:** Client → CoordinateMapper::to_local → Compositor

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration
pub mod config;

/// Multi-monitor engine
pub mod multimon;

/// Input coordinate mapping
pub mod input;

/// Compositor output interface
pub mod compositor;

/// Display loop and protocol-side handler
pub mod server;

/// Utility functions
pub mod utils;
