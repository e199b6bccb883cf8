//! Plain 2D geometry shared by the layout engine and the composer.
//!
//! Coordinates are canvas units with the origin at the top-left corner and
//! Y growing downwards, matching raster image space.

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum X.
    pub min_x: f64,
    /// Minimum Y.
    pub min_y: f64,
    /// Maximum X.
    pub max_x: f64,
    /// Maximum Y.
    pub max_y: f64,
}

impl Rect {
    /// Creates a rectangle from its bounds.
    #[must_use]
    pub const fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a rectangle covering a `width` × `height` canvas.
    #[must_use]
    pub const fn canvas(width: f64, height: f64) -> Self {
        Self::from_bounds(0.0, 0.0, width, height)
    }

    /// Returns the rectangle width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the rectangle height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the centre point.
    #[must_use]
    pub fn centre(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Shrinks the rectangle by independent amounts on each edge.
    #[must_use]
    pub fn inset(&self, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::from_bounds(
            self.min_x + left,
            self.min_y + top,
            self.max_x - right,
            self.max_y - bottom,
        )
    }

    /// Returns `true` if the point lies inside or on the edge, within `tolerance`.
    #[must_use]
    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        p.x >= self.min_x - tolerance
            && p.x <= self.max_x + tolerance
            && p.y >= self.min_y - tolerance
            && p.y <= self.max_y + tolerance
    }
}

/// Returns `true` if `value` is a multiple of `step` within a small tolerance.
#[must_use]
pub fn is_multiple_of(value: f64, step: f64) -> bool {
    let units = value / step;
    (units - units.round()).abs() < 1e-6
}
