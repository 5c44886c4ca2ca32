//! Server Integration Module
//!
//! Couples the multi-head engine to the remote-display server's threads.
//!
//! # Threading Model
//!
//! ```text
//! I/O thread (tokio)                     compositor main loop thread
//! ──────────────────                     ───────────────────────────
//! DisplayControlHandler                  DisplayLoop<O: OutputControl>
//!   request_layout(msg) ──LayoutTask──>    MonitorManager::apply_layout
//!        ↑                 (crossbeam)       └─> OutputControl calls
//!        └──────── oneshot reply ─────────
//! ```
//!
//! The I/O side only posts layout values. Heads and outputs are touched on
//! the main loop thread alone, one transaction at a time, in FIFO order.

pub mod display_control;
pub mod display_loop;

pub use display_control::DisplayControlHandler;
pub use display_loop::{DisplayLoop, LayoutReply, LayoutResult, LayoutSubmitter, LayoutTask, QueueError};
