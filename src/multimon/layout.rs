//! Layout Projection Engine
//!
//! Computes each monitor's rectangle in local (compositor) space from a
//! validated topology and resolved scales.

use tracing::{debug, warn};

use crate::multimon::topology::{Arrangement, Topology, TopologyError};
use crate::multimon::types::{Rectangle, ResolvedMonitorMode};

/// Layout after projection into local space
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLayout {
    /// Monitors in processing order, with local rectangles filled in
    pub modes: Vec<ResolvedMonitorMode>,

    /// Arrangement used for projection (Horizontal for complex placements)
    pub arrangement: Arrangement,

    /// Some monitor asked for a scale other than 1.0
    pub scaling_used: bool,

    /// Scaling was actually applied
    pub scaling_applied: bool,
}

impl ProjectedLayout {
    /// Bounding box of all local rectangles
    pub fn local_bounds(&self) -> Rectangle {
        self.modes
            .iter()
            .fold(Rectangle::default(), |acc, mode| acc.union(&mode.local_rect))
    }
}

/// Projects client topologies into local space
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutProjector;

impl LayoutProjector {
    /// Create a new projector
    pub fn new() -> Self {
        Self
    }

    /// Project resolved monitors into local space
    ///
    /// `modes` must be indexed like the monitors the topology was analyzed
    /// from. The result is reordered along the topology's chain.
    ///
    /// Scaling is disabled for the whole layout when the placement is
    /// complex; every monitor then ends up with identity scales.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::LocalSpaceOverflow`] when a local rectangle
    /// does not fit i32 coordinates.
    pub fn project(
        &self,
        topology: &Topology,
        modes: &[ResolvedMonitorMode],
    ) -> Result<ProjectedLayout, TopologyError> {
        let mut ordered: Vec<ResolvedMonitorMode> =
            topology.order().into_iter().map(|i| modes[i]).collect();

        let scaling_used = ordered.iter().any(|mode| mode.client_scale != 1.0);

        if scaling_used && topology.is_complex() {
            warn!("Scaling is used, but can't be supported in complex monitor placement");
        }

        let scaling_applied = match topology.arrangement() {
            Ok(arrangement) if scaling_used => {
                Self::project_scaled(topology, arrangement, &mut ordered)?;
                true
            }
            _ => {
                Self::project_unscaled(topology, &mut ordered)?;
                false
            }
        };

        for (i, mode) in ordered.iter().enumerate() {
            debug!(
                "monitor[{}]: client {} -> local {}, scale:{}, clientScale:{:.2}",
                i,
                mode.client_rect(),
                mode.local_rect,
                mode.output_scale,
                mode.client_scale
            );
        }

        Ok(ProjectedLayout {
            modes: ordered,
            arrangement: topology.arrangement().unwrap_or(Arrangement::Horizontal),
            scaling_used,
            scaling_applied,
        })
    }

    /// Walk the chain, packing scaled rectangles along its axis
    fn project_scaled(
        topology: &Topology,
        arrangement: Arrangement,
        modes: &mut [ResolvedMonitorMode],
    ) -> Result<(), TopologyError> {
        let upper_left = topology.upper_left;
        let mut offset: i64 = 0;

        for mode in modes.iter_mut() {
            let scale = mode.output_scale.max(1);
            let width = mode.monitor.width / scale;
            let height = mode.monitor.height / scale;

            mode.local_rect = match arrangement {
                Arrangement::Horizontal => {
                    let y = (i64::from(upper_left.y) - i64::from(mode.monitor.y)).abs()
                        / i64::from(scale);
                    let rect = local_rect(offset, y, width, height)?;
                    offset += i64::from(width);
                    rect
                }
                Arrangement::Vertical => {
                    let x = (i64::from(upper_left.x) - i64::from(mode.monitor.x)).abs()
                        / i64::from(scale);
                    let rect = local_rect(x, offset, width, height)?;
                    offset += i64::from(height);
                    rect
                }
            };
        }

        Ok(())
    }

    /// Translate client rectangles so the upper-left corner lands on the
    /// local origin, forcing identity scales
    fn project_unscaled(
        topology: &Topology,
        modes: &mut [ResolvedMonitorMode],
    ) -> Result<(), TopologyError> {
        let dx = i64::from(topology.upper_left.x).abs();
        let dy = i64::from(topology.upper_left.y).abs();

        for mode in modes.iter_mut() {
            mode.local_rect = local_rect(
                i64::from(mode.monitor.x) + dx,
                i64::from(mode.monitor.y) + dy,
                mode.monitor.width,
                mode.monitor.height,
            )?;
            mode.output_scale = 1;
            mode.client_scale = 1.0;
        }

        Ok(())
    }
}

/// Local rectangle with a non-negative origin whose far edges fit i32
fn local_rect(x: i64, y: i64, width: u32, height: u32) -> Result<Rectangle, TopologyError> {
    let fits = |origin: i64, extent: u32| {
        origin >= 0 && origin + i64::from(extent) <= i64::from(i32::MAX)
    };
    if !fits(x, width) || !fits(y, height) {
        return Err(TopologyError::LocalSpaceOverflow);
    }
    Ok(Rectangle::new(x as i32, y as i32, width, height))
}
