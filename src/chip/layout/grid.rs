//! Grid-array layout (BGA, PGA).
//!
//! `ceil(sqrt(n))` columns, as many rows as needed, filled row-major from the
//! top-left. Pins sit under the body so they have no side.

use crate::chip::descriptor::PinSpec;
use crate::chip::error::RenderResult;
use crate::chip::layout::{Grid, PinArranger, PositionedPin, Side};
use crate::chip::package::canvas::grid_columns;

/// Arranger for grid-array packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridArrayArranger;

impl PinArranger for GridArrayArranger {
    fn arrange(
        &self,
        grid: Grid,
        pins: &[PinSpec],
        width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>> {
        let columns = grid_columns(pins.len());
        let rows = pins.len().div_ceil(columns.max(1));

        let xs = grid.spread(columns, width)?;
        let ys = grid.spread(rows, height)?;

        Ok(pins
            .iter()
            .enumerate()
            .map(|(i, pin)| PositionedPin::new(pin, Side::None, xs[i % columns], ys[i / columns]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::geometry::is_multiple_of;
    use crate::chip::layout::{layout, numbered_pins};
    use crate::chip::package::resolve;

    #[test]
    fn bga_fills_row_major() {
        let t = resolve("BGA-10").unwrap();
        let placed = layout(&t, &numbered_pins(10), 200.0, 200.0, 10.0).unwrap();
        // 4 columns, 3 rows, last row partly filled
        assert!(placed.iter().all(|p| p.side == Side::None));
        assert!((placed[0].y - placed[3].y).abs() < 1e-9);
        assert!(placed[4].y > placed[3].y);
        assert!((placed[4].x - placed[0].x).abs() < 1e-9);
        assert!(placed[1].x > placed[0].x);
        assert!(placed[9].y > placed[5].y);
    }

    #[test]
    fn bga352_fits_400_canvas() {
        let t = resolve("BGA-352").unwrap();
        let placed = layout(&t, &numbered_pins(352), 400.0, 400.0, 10.0).unwrap();
        assert_eq!(placed.len(), 352);
        for p in &placed {
            assert!(is_multiple_of(p.x, 10.0) && is_multiple_of(p.y, 10.0));
            assert!(p.x >= 10.0 && p.x <= 390.0);
            assert!(p.y >= 10.0 && p.y <= 390.0);
        }
    }
}
