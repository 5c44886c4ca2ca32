//! Shared geometry and monitor types
//!
//! Client space is the coordinate system declared by the remote client;
//! local space is the compositor's global coordinate system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest desktop scale factor (percent) the protocol considers valid
pub const MIN_DESKTOP_SCALE_FACTOR: u32 = 100;

/// Highest desktop scale factor (percent) the protocol considers valid
pub const MAX_DESKTOP_SCALE_FACTOR: u32 = 500;

/// Largest monitor width or height a client may declare
pub const MAX_MONITOR_DIMENSION: u32 = 8192;

/// Largest distance of any monitor edge from the client origin
pub const MAX_DESKTOP_EXTENT: i64 = 32766;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rectangle {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rectangle {
    /// Create a new rectangle
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, widened so it cannot overflow
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge, widened so it cannot overflow
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Top-left corner
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if rectangle contains a point (right/bottom edges exclusive)
    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        px >= i64::from(self.x) && px < self.right() && py >= i64::from(self.y) && py < self.bottom()
    }

    /// Check if rectangle intersects another with a non-zero area
    pub fn intersects(&self, other: &Rectangle) -> bool {
        i64::from(self.x) < other.right()
            && self.right() > i64::from(other.x)
            && i64::from(self.y) < other.bottom()
            && self.bottom() > i64::from(other.y)
    }

    /// Bounding box of both rectangles; empty rectangles do not contribute
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rectangle {
            x,
            y,
            width: (right - i64::from(x)) as u32,
            height: (bottom - i64::from(y)) as u32,
        }
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{}) {}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Point in either coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Create a new size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Physical monitor orientation as reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// 0 degrees
    #[default]
    Landscape,
    /// 90 degrees
    Portrait,
    /// 180 degrees
    LandscapeFlipped,
    /// 270 degrees
    PortraitFlipped,
}

impl Orientation {
    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Self::Landscape => 0,
            Self::Portrait => 90,
            Self::LandscapeFlipped => 180,
            Self::PortraitFlipped => 270,
        }
    }
}

/// Per-monitor DPI and physical attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorAttributes {
    /// Physical width in millimeters
    pub physical_width: u32,
    /// Physical height in millimeters
    pub physical_height: u32,
    /// Orientation
    pub orientation: Orientation,
    /// Desktop scale factor in percent (100 = no scaling)
    pub desktop_scale_factor: u32,
    /// Device scale factor in percent
    pub device_scale_factor: u32,
}

impl Default for MonitorAttributes {
    fn default() -> Self {
        Self {
            physical_width: 0,
            physical_height: 0,
            orientation: Orientation::Landscape,
            desktop_scale_factor: 100,
            device_scale_factor: 100,
        }
    }
}

impl MonitorAttributes {
    /// Desktop scale factor, with out-of-range values treated as 100%
    pub fn effective_desktop_scale_factor(&self) -> u32 {
        if (MIN_DESKTOP_SCALE_FACTOR..=MAX_DESKTOP_SCALE_FACTOR)
            .contains(&self.desktop_scale_factor)
        {
            self.desktop_scale_factor
        } else {
            MIN_DESKTOP_SCALE_FACTOR
        }
    }
}

/// One monitor as declared by the client, in client space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorDescriptor {
    /// Left edge in client space
    pub x: i32,
    /// Top edge in client space
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Primary monitor flag
    #[serde(default)]
    pub is_primary: bool,
    /// DPI and physical attributes
    #[serde(default)]
    pub attributes: MonitorAttributes,
}

impl MonitorDescriptor {
    /// Create a descriptor with default (100%) attributes
    pub fn new(x: i32, y: i32, width: u32, height: u32, is_primary: bool) -> Self {
        Self {
            x,
            y,
            width,
            height,
            is_primary,
            attributes: MonitorAttributes::default(),
        }
    }

    /// Builder: set the desktop scale factor (percent)
    pub fn with_desktop_scale(mut self, desktop_scale_factor: u32) -> Self {
        self.attributes.desktop_scale_factor = desktop_scale_factor;
        self
    }

    /// Builder: set the physical size in millimeters
    pub fn with_physical_size(mut self, width_mm: u32, height_mm: u32) -> Self {
        self.attributes.physical_width = width_mm;
        self.attributes.physical_height = height_mm;
        self
    }

    /// Rectangle in client space
    pub fn rect(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }
}

/// Monitor layout message as parsed by the protocol layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorLayoutMessage {
    /// Declared monitors, in client order
    pub monitors: Vec<MonitorDescriptor>,
}

impl MonitorLayoutMessage {
    /// Create a message from a monitor list
    pub fn new(monitors: Vec<MonitorDescriptor>) -> Self {
        Self { monitors }
    }
}

/// Monitor with resolved scales and its rectangle in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMonitorMode {
    /// Client declaration
    pub monitor: MonitorDescriptor,
    /// Integer scale applied to the compositor output (>= 1)
    pub output_scale: u32,
    /// Fractional scale between client and local space (> 0)
    pub client_scale: f64,
    /// Rectangle in local space
    pub local_rect: Rectangle,
}

impl ResolvedMonitorMode {
    /// Rectangle in client space
    pub fn client_rect(&self) -> Rectangle {
        self.monitor.rect()
    }

    /// Same client size and output scale
    pub fn same_size_and_scale(&self, other: &ResolvedMonitorMode) -> bool {
        self.monitor.width == other.monitor.width
            && self.monitor.height == other.monitor.height
            && self.output_scale == other.output_scale
    }

    /// Same client position
    pub fn same_client_position(&self, other: &ResolvedMonitorMode) -> bool {
        self.monitor.x == other.monitor.x && self.monitor.y == other.monitor.y
    }
}

/// Union of all monitor rectangles in both spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutBounds {
    client: Rectangle,
    local: Rectangle,
}

impl LayoutBounds {
    /// Reset to empty
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Add one monitor to the union
    pub fn accumulate(&mut self, mode: &ResolvedMonitorMode) {
        self.client = self.client.union(&mode.client_rect());
        self.local = self.local.union(&mode.local_rect);
    }

    /// Union in client space
    pub fn client(&self) -> Rectangle {
        self.client
    }

    /// Union in local space
    pub fn local(&self) -> Rectangle {
        self.local
    }
}
