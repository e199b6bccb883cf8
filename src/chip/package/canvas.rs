//! Preferred canvas sizes.
//!
//! Each topology gets a canvas just large enough to place every pin one grid
//! unit apart, with the layout margin plus one spare grid unit on both ends
//! of every pin row. Dual-in-line bodies widen in steps as the pin count
//! grows, the way real 0.3", 0.6" and 0.9" row spacings do.

use crate::chip::error::{RenderError, RenderResult};
use crate::chip::package::{PackageTopology, TopologyKind};

/// Smallest side of a preferred canvas, in grid units.
const MIN_SIDE_UNITS: f64 = 4.0;

/// Width of single-column canvases, in grid units.
const COLUMN_WIDTH_UNITS: f64 = 6.0;

/// Returns the row spacing of a dual-in-line body, in grid units.
const fn dip_width_units(pin_count: usize) -> f64 {
    if pin_count <= 40 {
        8.0
    } else if pin_count <= 48 {
        10.0
    } else {
        12.0
    }
}

/// Computes a `(width, height)` canvas that fits `pin_count` pins.
///
/// # Errors
///
/// Returns [`RenderError::InvalidGeometry`] if `grid_size` is not finite and
/// positive or `margin` is not finite and non-negative.
#[allow(clippy::cast_precision_loss)]
pub fn preferred_canvas(
    topology: &PackageTopology,
    pin_count: usize,
    grid_size: f64,
    margin: f64,
) -> RenderResult<(f64, f64)> {
    if !grid_size.is_finite() || grid_size <= 0.0 {
        return Err(RenderError::invalid_geometry(format!(
            "grid size must be positive, got {grid_size}"
        )));
    }
    if !margin.is_finite() || margin < 0.0 {
        return Err(RenderError::invalid_geometry(format!(
            "margin must be non-negative, got {margin}"
        )));
    }

    let margin = margin.max(grid_size);
    let extent = |rows: usize| {
        let span = rows.saturating_sub(1) as f64 * grid_size;
        let raw = 2.0f64.mul_add(margin + grid_size, span);
        ((raw / grid_size).ceil().max(MIN_SIDE_UNITS)) * grid_size
    };

    let n = pin_count.max(1);
    let size = match topology.kind {
        TopologyKind::DualInLine => {
            let height = extent(n.div_ceil(2));
            (dip_width_units(n) * grid_size, height)
        }
        TopologyKind::QuadSide => {
            let side = extent(n.div_ceil(4));
            (side, side)
        }
        TopologyKind::GridArray => {
            let side = extent(grid_columns(n));
            (side, side)
        }
        TopologyKind::SingleRow | TopologyKind::Connector | TopologyKind::Module => {
            (COLUMN_WIDTH_UNITS * grid_size, extent(n))
        }
    };
    Ok(size)
}

/// Number of columns of a grid array with `n` pins: `ceil(sqrt(n))`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn grid_columns(n: usize) -> usize {
    let mut c = (n as f64).sqrt() as usize;
    // float sqrt can land one off either way for large n
    while c * c < n {
        c += 1;
    }
    while c > 0 && (c - 1) * (c - 1) >= n {
        c -= 1;
    }
    c
}
