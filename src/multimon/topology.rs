//! Topology Validation
//!
//! Enforces the primary-monitor invariants on a client-declared layout and
//! detects whether the monitors form a contiguous horizontal or vertical
//! chain.

use thiserror::Error;
use tracing::debug;

use crate::multimon::types::{
    MonitorDescriptor, Point, Rectangle, MAX_DESKTOP_EXTENT, MAX_MONITOR_DIMENSION,
};

/// Topology validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Layout has no monitors
    #[error("Layout contains no monitors")]
    NoMonitors,

    /// More monitors than supported
    #[error("Layout declares {count} monitors (max: {max})")]
    TooManyMonitors {
        /// Declared monitor count
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// Monitor width or height is zero or above the protocol limit
    #[error("Invalid monitor dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    /// Monitor extends past the virtual desktop limit
    #[error("Monitor {index} at {rect} is outside the virtual desktop")]
    MonitorOutOfBounds {
        /// Declaration index of the monitor
        index: usize,
        /// Declared client rectangle
        rect: Rectangle,
    },

    /// Projected rectangles do not fit local coordinates
    #[error("Projected layout does not fit local coordinates")]
    LocalSpaceOverflow,

    /// Zero or several primary monitors
    #[error("Expected exactly one primary monitor, found {0}")]
    PrimaryCountInvalid(usize),

    /// Primary monitor not at the client origin
    #[error("Primary monitor must be at (0, 0), found ({0}, {1})")]
    PrimaryNotAtOrigin(i32, i32),

    /// Two monitors cover the same client pixels
    #[error("Monitors {0} and {1} overlap")]
    MonitorsOverlap(usize, usize),

    /// Monitors are not chained along either axis
    #[error("Monitors are neither horizontally nor vertically connected")]
    ComplexPlacement,
}

impl TopologyError {
    /// Whether the error rejects the whole layout
    ///
    /// `ComplexPlacement` only disables scaling; everything else rejects.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ComplexPlacement)
    }
}

/// Axis along which monitors are chained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrangement {
    /// Left to right
    Horizontal,
    /// Top to bottom
    Vertical,
}

/// Monitors chained along one axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Chain axis
    pub arrangement: Arrangement,
    /// Monitor indices sorted along the axis
    pub order: Vec<usize>,
}

/// Result of analyzing an accepted layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Upper-left corner of the combined client desktop (both components <= 0)
    pub upper_left: Point,
    /// Chain, or None for a complex placement
    pub chain: Option<Chain>,
    monitor_count: usize,
}

impl Topology {
    /// Topology built without validation
    #[cfg(test)]
    pub(crate) fn unchecked(upper_left: Point, chain: Option<Chain>, monitor_count: usize) -> Self {
        Self {
            upper_left,
            chain,
            monitor_count,
        }
    }

    /// Chain arrangement, or `ComplexPlacement`
    pub fn arrangement(&self) -> Result<Arrangement, TopologyError> {
        self.chain
            .as_ref()
            .map(|chain| chain.arrangement)
            .ok_or(TopologyError::ComplexPlacement)
    }

    /// True when the monitors are not chained
    pub fn is_complex(&self) -> bool {
        self.chain.is_none()
    }

    /// Processing order: chain order, or declaration order for complex placements
    pub fn order(&self) -> Vec<usize> {
        match &self.chain {
            Some(chain) => chain.order.clone(),
            None => (0..self.monitor_count).collect(),
        }
    }
}

/// Validates client monitor topologies
#[derive(Debug, Clone, Copy)]
pub struct TopologyValidator {
    max_monitors: usize,
}

impl Default for TopologyValidator {
    fn default() -> Self {
        Self {
            max_monitors: crate::config::MAX_MONITORS,
        }
    }
}

impl TopologyValidator {
    /// Create a validator accepting at most `max_monitors` monitors
    pub fn new(max_monitors: usize) -> Self {
        Self { max_monitors }
    }

    /// Validate and return the arrangement
    ///
    /// # Errors
    ///
    /// Fatal errors reject the layout; `ComplexPlacement` means the layout
    /// is acceptable but not chained.
    pub fn validate(&self, monitors: &[MonitorDescriptor]) -> Result<Arrangement, TopologyError> {
        self.analyze(monitors)?.arrangement()
    }

    /// Validate and return the full topology
    ///
    /// Only fatal errors are returned as `Err`; a complex placement is an
    /// `Ok` topology without a chain.
    pub fn analyze(&self, monitors: &[MonitorDescriptor]) -> Result<Topology, TopologyError> {
        if monitors.is_empty() {
            return Err(TopologyError::NoMonitors);
        }
        if monitors.len() > self.max_monitors {
            return Err(TopologyError::TooManyMonitors {
                count: monitors.len(),
                max: self.max_monitors,
            });
        }
        let valid_dimension = |d: u32| (1..=MAX_MONITOR_DIMENSION).contains(&d);
        if let Some(m) = monitors
            .iter()
            .find(|m| !valid_dimension(m.width) || !valid_dimension(m.height))
        {
            return Err(TopologyError::InvalidDimensions(m.width, m.height));
        }
        for (index, m) in monitors.iter().enumerate() {
            let rect = m.rect();
            let edges = [i64::from(rect.x), i64::from(rect.y), rect.right(), rect.bottom()];
            if edges.iter().any(|edge| edge.abs() > MAX_DESKTOP_EXTENT) {
                return Err(TopologyError::MonitorOutOfBounds { index, rect });
            }
        }

        let primary_count = monitors.iter().filter(|m| m.is_primary).count();
        if primary_count != 1 {
            return Err(TopologyError::PrimaryCountInvalid(primary_count));
        }
        if let Some(primary) = monitors.iter().find(|m| m.is_primary) {
            if primary.x != 0 || primary.y != 0 {
                return Err(TopologyError::PrimaryNotAtOrigin(primary.x, primary.y));
            }
        }

        for (i, a) in monitors.iter().enumerate() {
            for (j, b) in monitors.iter().enumerate().skip(i + 1) {
                if a.rect().intersects(&b.rect()) {
                    return Err(TopologyError::MonitorsOverlap(i, j));
                }
            }
        }

        let upper_left = monitors.iter().fold(Point::default(), |ul, m| {
            Point::new(ul.x.min(m.x), ul.y.min(m.y))
        });
        debug_assert!(upper_left.x <= 0 && upper_left.y <= 0);
        debug!(
            "Client desktop upper left coordinate ({},{})",
            upper_left.x, upper_left.y
        );

        let chain = if monitors.len() == 1 {
            Some(Chain {
                arrangement: Arrangement::Horizontal,
                order: vec![0],
            })
        } else {
            chain_along(monitors, Arrangement::Horizontal)
                .or_else(|| chain_along(monitors, Arrangement::Vertical))
        };

        match &chain {
            Some(chain) => debug!("All monitors are {:?}ly placed", chain.arrangement),
            None => debug!("Monitors are not connected along either axis"),
        }

        Ok(Topology {
            upper_left,
            chain,
            monitor_count: monitors.len(),
        })
    }
}

/// Open-interval overlap of `[l1, l2)` and `[r1, r2)`
fn is_line_intersected(l1: i64, l2: i64, r1: i64, r2: i64) -> bool {
    l1.max(r1) < l2.min(r2)
}

/// Sort along the axis and check that each monitor starts where the
/// previous one ends while their cross-axis spans overlap
fn chain_along(monitors: &[MonitorDescriptor], arrangement: Arrangement) -> Option<Chain> {
    // (start, length, cross start, cross end) along the chosen axis
    let span = |m: &MonitorDescriptor| match arrangement {
        Arrangement::Horizontal => (
            i64::from(m.x),
            i64::from(m.width),
            i64::from(m.y),
            m.rect().bottom(),
        ),
        Arrangement::Vertical => (
            i64::from(m.y),
            i64::from(m.height),
            i64::from(m.x),
            m.rect().right(),
        ),
    };

    let mut order: Vec<usize> = (0..monitors.len()).collect();
    order.sort_by_key(|&i| span(&monitors[i]).0);

    for pair in order.windows(2) {
        let (prev_start, prev_len, prev_lo, prev_hi) = span(&monitors[pair[0]]);
        let (start, _, lo, hi) = span(&monitors[pair[1]]);

        if prev_start + prev_len != start {
            debug!(
                "Monitors not {:?}ly connected at {} (edge check)",
                arrangement, pair[1]
            );
            return None;
        }
        if !is_line_intersected(prev_lo, prev_hi, lo, hi) {
            debug!(
                "Monitors not {:?}ly connected at {} (span check)",
                arrangement, pair[1]
            );
            return None;
        }
    }

    Some(Chain { arrangement, order })
}
