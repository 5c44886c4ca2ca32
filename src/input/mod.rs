//! Input Coordinate Mapping
//!
//! Used by the input-event path to translate pointer and touch events
//! between the remote client's monitor space and the compositor.
//!
//! ```text
//! client event (x, y)
//!       ↓
//! CoordinateMapper::to_local  → head, output, local (x, y)
//!       ↓
//! compositor input
//! ```

pub mod coordinates;

pub use coordinates::{ClientMapping, CoordinateMapper, LocalMapping};
