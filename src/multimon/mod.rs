//! Multi-Monitor Support Module
//!
//! Reconciles client-declared monitor layouts into compositor outputs.
//!
//! # Overview
//!
//! Every layout message goes through one transaction:
//!
//! ```text
//! MonitorLayoutMessage
//!       ↓
//! TopologyValidator  → reject (no/several primaries, primary off origin, ...)
//!       ↓              or Topology (horizontal / vertical chain, or complex)
//! ScaleResolver      → output scale (integer) + client scale (fractional)
//!       ↓
//! LayoutProjector    → local rectangles
//!       ↓
//! ReconciliationTransaction over HeadRegistry
//!       ↓
//! OutputControl calls (only for heads that actually changed)
//! ```
//!
//! # Heads
//!
//! A head is the durable identity of one logical monitor. Heads are reused
//! across layouts whenever possible so that outputs keep their surfaces and
//! focus:
//!
//! 1. identical mode → reused with no compositor call
//! 2. same size and scale → reused, only moved
//! 3. same client position → reused, mode updated
//! 4. any leftover head → reused, mode updated
//! 5. otherwise a new head (and output) is created
//!
//! Heads that match no monitor are destroyed at commit.
//!
//! # Layout Projection
//!
//! Monitors chained left-to-right are packed along x in local space, each
//! shrunk by its output scale:
//!
//! ```text
//! client:  ┌────────────────┬──────────┐
//!          │ 3840x2160 @2x  │1920x1080 │
//!          └────────────────┴──────────┘
//! local:   ┌──────────┬──────────┐
//!          │1920x1080 │1920x1080 │
//!          └──────────┴──────────┘
//! ```
//!
//! Top-to-bottom chains are the transpose. Any other placement is accepted
//! but projected without scaling.
//!
//! # Example
//!
//! ```
//! use lamco_rdp_multihead::compositor::VirtualOutputs;
//! use lamco_rdp_multihead::config::Config;
//! use lamco_rdp_multihead::multimon::{MonitorDescriptor, MonitorLayoutMessage, MonitorManager};
//!
//! let mut manager = MonitorManager::from_config(&Config::default());
//! let mut outputs = VirtualOutputs::new();
//!
//! let layout = MonitorLayoutMessage::new(vec![
//!     MonitorDescriptor::new(0, 0, 1920, 1080, true),
//!     MonitorDescriptor::new(1920, 0, 1920, 1080, false),
//! ]);
//! let ack = manager.apply_layout(&layout, &mut outputs).unwrap();
//!
//! assert_eq!(ack.local_bounds.width, 3840);
//! assert!(manager.primary_output().is_some());
//! ```

pub mod head;
pub mod layout;
pub mod manager;
pub mod scale;
pub mod topology;
pub mod transaction;
pub mod types;

pub use head::{Head, HeadId, HeadRegistry, HeadSet, RegistryError};
pub use layout::{LayoutProjector, ProjectedLayout};
pub use manager::{LayoutAck, LayoutError, MonitorManager, OutputConfig};
pub use scale::ScaleResolver;
pub use topology::{Arrangement, Chain, Topology, TopologyError, TopologyValidator};
pub use transaction::{ReconciliationTransaction, TransactionReport};
pub use types::{
    LayoutBounds, MonitorAttributes, MonitorDescriptor, MonitorLayoutMessage, Orientation, Point,
    Rectangle, ResolvedMonitorMode, Size,
};
