//! Dual-in-line layout.
//!
//! Pins `1..=k` (with `k = ceil(n/2)`) run down the left column at `x = 0`.
//! The remaining pins continue counter-clockwise: pin `k + 1` sits at the
//! bottom of the right column and pin `n` at the top, so reading the right
//! column top-to-bottom gives `n, n-1, ..., k+1`. Odd counts leave the
//! bottom slot of the right column empty.

use crate::chip::descriptor::PinSpec;
use crate::chip::error::{RenderError, RenderResult};
use crate::chip::layout::{Grid, PinArranger, PositionedPin, Side};

/// Arranger for dual-in-line packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct DualInLineArranger;

impl PinArranger for DualInLineArranger {
    fn arrange(
        &self,
        grid: Grid,
        pins: &[PinSpec],
        width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>> {
        let n = pins.len();
        let k = n.div_ceil(2);
        let ys = grid.spread(k, height)?;

        let right_x = grid.snap_down(width);
        if n > 1 && right_x <= 0.0 {
            return Err(RenderError::invalid_geometry(format!(
                "canvas width {width} leaves no room for a second pin column"
            )));
        }

        let right_count = n - k;
        let placed = pins
            .iter()
            .enumerate()
            .map(|(i, pin)| {
                if i < k {
                    PositionedPin::new(pin, Side::Left, 0.0, ys[i])
                } else {
                    // i = k is the bottom of the right column, i = n-1 the top
                    let slot = n - 1 - i;
                    debug_assert!(slot < right_count);
                    PositionedPin::new(pin, Side::Right, right_x, ys[slot])
                }
            })
            .collect();
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::geometry::is_multiple_of;
    use crate::chip::layout::{layout, numbered_pins};
    use crate::chip::package::resolve;

    #[test]
    fn dip40_at_240_by_260() {
        let t = resolve("DIP-40").unwrap();
        let placed = layout(&t, &numbered_pins(40), 240.0, 260.0, 10.0).unwrap();
        assert_eq!(placed.len(), 40);

        let left: Vec<&PositionedPin> = placed.iter().filter(|p| p.side == Side::Left).collect();
        assert_eq!(left.len(), 20);
        for (i, p) in left.iter().enumerate() {
            assert_eq!(p.pin.number as usize, i + 1);
            assert!(p.x.abs() < f64::EPSILON);
            assert!((p.y - (40.0 + 10.0 * i as f64)).abs() < 1e-9);
        }

        let mut right: Vec<&PositionedPin> =
            placed.iter().filter(|p| p.side == Side::Right).collect();
        right.sort_by(|a, b| a.y.total_cmp(&b.y));
        let numbers: Vec<u32> = right.iter().map(|p| p.pin.number).collect();
        let expected: Vec<u32> = (21..=40).rev().collect();
        assert_eq!(numbers, expected);
        assert!(right.iter().all(|p| (p.x - 240.0).abs() < 1e-9));

        // the span sits within half a grid unit of the canvas centre
        let mid = (left[0].y + left[19].y) / 2.0;
        assert!((mid - 130.0).abs() <= 5.0);
    }

    #[test]
    fn rows_line_up() {
        let t = resolve("DIP-16").unwrap();
        let placed = layout(&t, &numbered_pins(16), 80.0, 200.0, 10.0).unwrap();
        // pin 1 and pin 16 share a row, as do pin 8 and pin 9
        assert!((placed[0].y - placed[15].y).abs() < 1e-9);
        assert!((placed[7].y - placed[8].y).abs() < 1e-9);
    }

    #[test]
    fn odd_count_puts_extra_pin_left() {
        let t = resolve("DIP-7").unwrap();
        let placed = layout(&t, &numbered_pins(7), 80.0, 100.0, 10.0).unwrap();
        let left = placed.iter().filter(|p| p.side == Side::Left).count();
        assert_eq!(left, 4);
        assert_eq!(placed.len() - left, 3);
        // pin 5 is bottom of the right column, level with pin 3
        assert!((placed[4].y - placed[2].y).abs() < 1e-9);
    }

    #[test]
    fn right_column_snaps_down() {
        let t = resolve("DIP-4").unwrap();
        let placed = layout(&t, &numbered_pins(4), 85.0, 100.0, 10.0).unwrap();
        assert!((placed[2].x - 80.0).abs() < 1e-9);
        for p in &placed {
            assert!(is_multiple_of(p.x, 10.0));
            assert!(is_multiple_of(p.y, 10.0));
            assert!(p.x <= 85.0 && p.y <= 100.0);
        }
    }

    #[test]
    fn single_pin_is_centred() {
        let t = resolve("DIP").unwrap();
        let placed = layout(&t, &numbered_pins(1), 80.0, 100.0, 10.0).unwrap();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].side, Side::Left);
        assert!((placed[0].y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn too_many_for_height() {
        let t = resolve("DIP-64").unwrap();
        let err = layout(&t, &numbered_pins(64), 120.0, 100.0, 10.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidPinCount { count: 32, limit: 9 }));
    }

    #[test]
    fn narrow_canvas_is_rejected() {
        let t = resolve("DIP-4").unwrap();
        let err = layout(&t, &numbered_pins(4), 5.0, 100.0, 10.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidGeometry { .. }));
    }
}
