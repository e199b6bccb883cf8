//! Pin layout engine.
//!
//! Assigns every declared pin a side and a grid-snapped coordinate on a
//! `width` × `height` canvas. Spacing is derived from the usable span of each
//! pin row (canvas minus the margin at both ends), snapped to whole grid
//! units, and clamped so the row always fits.
//!
//! Each topology has its own [`PinArranger`]:
//!
//! - [`dual::DualInLineArranger`]: two columns, pin 1 top-left, numbering
//!   continues from the bottom of the right column
//! - [`quad::QuadArranger`]: four sides, clockwise from the top-left
//! - [`grid::GridArrayArranger`]: row-major 2D grid
//! - [`column::ColumnArranger`]: one column at the left edge
//!
//! All arrangers are pure. Identical inputs always produce identical output.

pub mod column;
pub mod dual;
pub mod grid;
pub mod quad;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::chip::color::{classify, PinClass};
use crate::chip::descriptor::PinSpec;
use crate::chip::error::{RenderError, RenderResult};
use crate::chip::geometry::Point;
use crate::chip::package::{PackageTopology, TopologyKind};

/// Default grid unit.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Default margin kept clear at both ends of every pin row.
pub const DEFAULT_MARGIN: f64 = 10.0;

/// Default ceiling on the number of pins in one layout.
pub const DEFAULT_MAX_PINS: usize = 2048;

/// Tolerance used when converting canvas units to whole grid units.
const UNIT_EPSILON: f64 = 1e-9;

/// Side of the package body a pin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Top edge.
    Top,
    /// Right edge.
    Right,
    /// Bottom edge.
    Bottom,
    /// Left edge.
    Left,
    /// Under the body (grid arrays).
    None,
}

/// A pin with its computed placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedPin {
    /// The declared pin.
    pub pin: PinSpec,
    /// Body side.
    pub side: Side,
    /// X coordinate in canvas units.
    pub x: f64,
    /// Y coordinate in canvas units.
    pub y: f64,
    /// Semantic class used for colouring.
    pub class: PinClass,
}

impl PositionedPin {
    /// Places a pin, classifying it on the way.
    #[must_use]
    pub fn new(pin: &PinSpec, side: Side, x: f64, y: f64) -> Self {
        Self {
            pin: pin.clone(),
            side,
            x,
            y,
            class: classify(pin),
        }
    }

    /// Returns the pin coordinate as a point.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Grid parameters shared by all arrangers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Grid unit. Every coordinate is a multiple of it.
    pub size: f64,
    /// Clearance at both ends of every pin row.
    pub margin: f64,
}

impl Grid {
    /// Creates grid parameters.
    #[must_use]
    pub const fn new(size: f64, margin: f64) -> Self {
        Self { size, margin }
    }

    /// Returns the same grid with the margin raised to at least one unit.
    #[must_use]
    pub fn with_min_margin_of_one_unit(self) -> Self {
        Self::new(self.size, self.margin.max(self.size))
    }

    /// Snaps `value` down to the grid.
    #[must_use]
    pub fn snap_down(&self, value: f64) -> f64 {
        self.floor_units(value) * self.size
    }

    fn floor_units(&self, value: f64) -> f64 {
        (value / self.size + UNIT_EPSILON).floor()
    }

    fn ceil_units(&self, value: f64) -> f64 {
        (value / self.size - UNIT_EPSILON).ceil()
    }

    /// First grid position at or past the margin.
    #[must_use]
    pub fn first_slot(&self) -> f64 {
        self.ceil_units(self.margin) * self.size
    }

    /// Number of grid positions available along an axis of length `extent`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn capacity(&self, extent: f64) -> usize {
        let lo = self.ceil_units(self.margin);
        let hi = self.floor_units(extent - self.margin);
        if hi < lo {
            0
        } else {
            (hi - lo) as usize + 1
        }
    }

    /// Spreads `count` positions evenly along an axis of length `extent`.
    ///
    /// Positions are whole grid multiples inside `[margin, extent - margin]`,
    /// at least one unit apart, and as close to centred as snapping allows.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidPinCount`] carrying the axis capacity if
    /// `count` positions do not fit one unit apart.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn spread(&self, count: usize, extent: f64) -> RenderResult<Vec<f64>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let capacity = self.capacity(extent);
        if count > capacity {
            return Err(RenderError::InvalidPinCount {
                count,
                limit: capacity,
            });
        }

        let lo = self.ceil_units(self.margin) as i64;
        let hi = self.floor_units(extent - self.margin) as i64;
        let extent_units = extent / self.size;

        if count == 1 {
            let centre = ((extent_units / 2.0).round() as i64).clamp(lo, hi);
            return Ok(vec![centre as f64 * self.size]);
        }

        let gaps = (count - 1) as i64;
        let raw = 2.0f64.mul_add(-self.margin, extent) / (count - 1) as f64 / self.size;
        let max_spacing = (hi - lo) / gaps;
        let spacing = (raw.round() as i64).max(1).min(max_spacing);
        let span = spacing * gaps;
        let start = (((extent_units - span as f64) / 2.0).round() as i64).clamp(lo, hi - span);

        debug!(count, extent, spacing, start, "spread pins along axis");

        Ok((0..count as i64)
            .map(|i| (start + i * spacing) as f64 * self.size)
            .collect())
    }
}

/// Places the pins of one topology kind.
pub trait PinArranger {
    /// Arranges `pins` on a `width` × `height` canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the pins cannot be placed one grid unit apart.
    fn arrange(
        &self,
        grid: Grid,
        pins: &[PinSpec],
        width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>>;
}

/// Returns the arranger for a topology kind.
#[must_use]
pub fn arranger_for(kind: TopologyKind) -> &'static dyn PinArranger {
    match kind {
        TopologyKind::DualInLine => &dual::DualInLineArranger,
        TopologyKind::QuadSide => &quad::QuadArranger,
        TopologyKind::GridArray => &grid::GridArrayArranger,
        TopologyKind::SingleRow | TopologyKind::Connector | TopologyKind::Module => {
            &column::ColumnArranger
        }
    }
}

/// Layout engine configured with a grid, margin and pin ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    /// Grid unit.
    pub grid_size: f64,
    /// Clearance at both ends of every pin row.
    pub margin: f64,
    /// Largest pin list accepted.
    pub max_pins: usize,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            margin: DEFAULT_MARGIN,
            max_pins: DEFAULT_MAX_PINS,
        }
    }
}

impl LayoutEngine {
    /// Creates an engine.
    #[must_use]
    pub const fn new(grid_size: f64, margin: f64, max_pins: usize) -> Self {
        Self {
            grid_size,
            margin,
            max_pins,
        }
    }

    /// Returns the grid parameters of this engine.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.grid_size, self.margin)
    }

    /// Lays out `pins` for `topology` on a `width` × `height` canvas.
    ///
    /// Output is in declared pin order.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidGeometry`] for a non-positive grid, a negative
    ///   margin, or a negative or non-finite canvas size.
    /// - [`RenderError::InvalidPinCount`] if the pin list exceeds `max_pins`
    ///   or does not fit one grid unit per pin.
    pub fn layout(
        &self,
        topology: &PackageTopology,
        pins: &[PinSpec],
        width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>> {
        self.validate(width, height)?;
        if pins.len() > self.max_pins {
            return Err(RenderError::InvalidPinCount {
                count: pins.len(),
                limit: self.max_pins,
            });
        }
        if pins.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            kind = ?topology.kind,
            pins = pins.len(),
            width,
            height,
            grid = self.grid_size,
            "laying out pins"
        );
        arranger_for(topology.kind).arrange(self.grid(), pins, width, height)
    }

    fn validate(&self, width: f64, height: f64) -> RenderResult<()> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(RenderError::invalid_geometry(format!(
                "grid size must be positive, got {}",
                self.grid_size
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(RenderError::invalid_geometry(format!(
                "margin must be non-negative, got {}",
                self.margin
            )));
        }
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(RenderError::invalid_geometry(format!(
                "canvas must be non-negative, got {width} x {height}"
            )));
        }
        Ok(())
    }
}

/// Lays out pins with the default margin and pin ceiling.
///
/// # Errors
///
/// See [`LayoutEngine::layout`].
///
/// # Examples
///
/// ```
/// use retro_chip_renderer::chip::descriptor::PinSpec;
/// use retro_chip_renderer::chip::layout::{layout, Side};
/// use retro_chip_renderer::chip::package::resolve;
///
/// let pins: Vec<PinSpec> = (1..=8).map(|n| PinSpec::new(n, format!("P{n}"))).collect();
/// let placed = layout(&resolve("DIP-8").unwrap(), &pins, 80.0, 100.0, 10.0).unwrap();
/// assert_eq!(placed.iter().filter(|p| p.side == Side::Left).count(), 4);
/// ```
pub fn layout(
    topology: &PackageTopology,
    pins: &[PinSpec],
    width: f64,
    height: f64,
    grid_size: f64,
) -> RenderResult<Vec<PositionedPin>> {
    LayoutEngine {
        grid_size,
        ..LayoutEngine::default()
    }
    .layout(topology, pins, width, height)
}

/// Counts pins per side, in first-seen order.
#[must_use]
pub fn side_counts(pins: &[PositionedPin]) -> IndexMap<Side, usize> {
    let mut counts = IndexMap::new();
    for pin in pins {
        *counts.entry(pin.side).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
pub(crate) fn numbered_pins(n: u32) -> Vec<PinSpec> {
    (1..=n).map(|i| PinSpec::new(i, format!("P{i}"))).collect()
}
