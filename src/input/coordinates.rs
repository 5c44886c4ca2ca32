//! Coordinate Transformation
//!
//! Maps pointer and touch coordinates between client space (as declared by
//! the remote client) and local space (the compositor's global space),
//! using the scale and offsets of the Active head the point falls on.
//!
//! Must only be used from the compositor's main loop thread.

use tracing::trace;

use crate::compositor::OutputHandle;
use crate::multimon::head::{Head, HeadId, HeadRegistry};
use crate::multimon::types::{Point, Size};

/// Result of mapping a client point into local space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMapping {
    /// Head containing the client point
    pub head: HeadId,
    /// Output bound to the head, if any
    pub output: Option<OutputHandle>,
    /// Point in local space
    pub point: Point,
    /// Size divided by the head's client scale
    pub size: Option<Size>,
}

/// Result of mapping a local point into client space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMapping {
    /// Head bound to the output
    pub head: HeadId,
    /// Point in client space
    pub point: Point,
    /// Size multiplied by the head's client scale
    pub size: Option<Size>,
}

/// Stateless client/local coordinate mapper over the Active heads
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    registry: &'a HeadRegistry,
}

impl<'a> CoordinateMapper<'a> {
    /// Create a mapper over a registry
    pub fn new(registry: &'a HeadRegistry) -> Self {
        Self { registry }
    }

    /// Active head whose client region contains `point`
    pub fn head_at(&self, point: Point) -> Option<&'a Head> {
        self.registry
            .active()
            .find(|head| head.client_region().contains(point))
    }

    /// Map a client point (and optional size) into local space
    ///
    /// Returns `None` when the point is outside every monitor.
    pub fn to_local(&self, point: Point, size: Option<Size>) -> Option<LocalMapping> {
        let head = self.head_at(point)?;
        let scale = head.mode().client_scale;
        let client = head.client_region();
        let local = head.local_region();

        let x = (i64::from(point.x) - i64::from(client.x)) as f64 / scale;
        let y = (i64::from(point.y) - i64::from(client.y)) as f64 / scale;
        let mapped = offset_point(local.origin(), x, y)?;

        trace!(
            "to_local: {:?} on head {} -> {:?} (scale {:.2})",
            point,
            head.id(),
            mapped,
            scale
        );

        Some(LocalMapping {
            head: head.id(),
            output: head.output(),
            point: mapped,
            size: size.map(|s| scale_size(s, 1.0 / scale)),
        })
    }

    /// Map a local point (and optional size) on `output` into client space
    ///
    /// Returns `None` when no Active head drives `output`, or when the
    /// mapped point does not fit client coordinates.
    pub fn to_client(
        &self,
        point: Point,
        output: OutputHandle,
        size: Option<Size>,
    ) -> Option<ClientMapping> {
        let head = self.registry.find_by_output(output)?;
        let scale = head.mode().client_scale;
        let client = head.client_region();
        let local = head.local_region();

        let x = (i64::from(point.x) - i64::from(local.x)) as f64 * scale;
        let y = (i64::from(point.y) - i64::from(local.y)) as f64 * scale;
        let Some(mapped) = offset_point(client.origin(), x, y) else {
            trace!("to_client: {:?} on {} is outside client coordinates", point, output);
            return None;
        };

        Some(ClientMapping {
            head: head.id(),
            point: mapped,
            size: size.map(|s| scale_size(s, scale)),
        })
    }
}

/// `origin` shifted by a truncated offset; None when it leaves i32 space
fn offset_point(origin: Point, dx: f64, dy: f64) -> Option<Point> {
    let x = i64::from(origin.x) + dx as i64;
    let y = i64::from(origin.y) + dy as i64;
    Some(Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

fn scale_size(size: Size, factor: f64) -> Size {
    Size::new(
        (f64::from(size.width) * factor) as u32,
        (f64::from(size.height) * factor) as u32,
    )
}
