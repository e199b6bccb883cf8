//! Four-sided layout (QFP, PLCC, SOIC and friends).
//!
//! Pins are dealt to the sides clockwise starting at the top-left corner:
//! top (left to right), right (top to bottom), bottom (right to left), then
//! left (bottom to top). Each side gets `floor(n/4)` pins and the remainder
//! goes one extra pin each to the first sides, so side counts never differ
//! by more than one.
//!
//! Corners are kept clear by raising the margin to at least one grid unit.
//! A lone pin on the top side sits at the first slot next to the top-left
//! corner rather than mid-side, so pin 1 stays the pin nearest that corner.

use crate::chip::descriptor::PinSpec;
use crate::chip::error::RenderResult;
use crate::chip::layout::{Grid, PinArranger, PositionedPin, Side};

/// Sides in numbering order.
const SIDES: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

/// Arranger for four-sided packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuadArranger;

/// Number of pins on each side, in [`SIDES`] order.
#[must_use]
pub const fn side_split(n: usize) -> [usize; 4] {
    let base = n / 4;
    let extra = n % 4;
    [
        base + (extra > 0) as usize,
        base + (extra > 1) as usize,
        base + (extra > 2) as usize,
        base,
    ]
}

impl PinArranger for QuadArranger {
    fn arrange(
        &self,
        grid: Grid,
        pins: &[PinSpec],
        width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>> {
        let grid = grid.with_min_margin_of_one_unit();
        let [top, right, bottom, left] = side_split(pins.len());

        let right_x = grid.snap_down(width);
        let bottom_y = grid.snap_down(height);

        let mut top_xs = grid.spread(top, width)?;
        if let [x] = top_xs.as_mut_slice() {
            *x = grid.first_slot();
        }
        let right_ys = grid.spread(right, height)?;
        let mut bottom_xs = grid.spread(bottom, width)?;
        bottom_xs.reverse();
        let mut left_ys = grid.spread(left, height)?;
        left_ys.reverse();

        let coords = top_xs
            .into_iter()
            .map(|x| (x, 0.0))
            .chain(right_ys.into_iter().map(|y| (right_x, y)))
            .chain(bottom_xs.into_iter().map(|x| (x, bottom_y)))
            .chain(left_ys.into_iter().map(|y| (0.0, y)));

        let counts = [top, right, bottom, left];
        let sides = SIDES
            .iter()
            .zip(counts)
            .flat_map(|(side, count)| std::iter::repeat(*side).take(count));

        Ok(pins
            .iter()
            .zip(sides.zip(coords))
            .map(|(pin, (side, (x, y)))| PositionedPin::new(pin, side, x, y))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::error::RenderError;
    use crate::chip::geometry::{is_multiple_of, Point};
    use crate::chip::layout::{layout, numbered_pins, side_counts};
    use crate::chip::package::resolve;

    #[test]
    fn split_is_balanced() {
        assert_eq!(side_split(64), [16, 16, 16, 16]);
        assert_eq!(side_split(66), [17, 17, 16, 16]);
        assert_eq!(side_split(3), [1, 1, 1, 0]);
        assert_eq!(side_split(0), [0, 0, 0, 0]);
        for n in 0..200 {
            let s = side_split(n);
            let max = s.iter().max().copied().unwrap_or(0);
            let min = s.iter().min().copied().unwrap_or(0);
            assert!(max - min <= 1, "{n}: {s:?}");
            assert_eq!(s.iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn qfp64_goes_clockwise() {
        let t = resolve("QFP-64").unwrap();
        let placed = layout(&t, &numbered_pins(64), 400.0, 400.0, 10.0).unwrap();
        let counts = side_counts(&placed);
        for side in SIDES {
            assert_eq!(counts.get(&side).copied(), Some(16));
        }

        // top runs left to right, bottom right to left
        assert!(placed[0].x < placed[15].x);
        assert!(placed[32].x > placed[47].x);
        // right runs down, left runs up
        assert!(placed[16].y < placed[31].y);
        assert!(placed[48].y > placed[63].y);

        let corner = Point::new(0.0, 0.0);
        let d1 = placed[0].point().distance_to(corner);
        assert!(placed.iter().all(|p| p.point().distance_to(corner) >= d1 - 1e-9));
    }

    #[test]
    fn lone_top_pin_hugs_top_left_corner() {
        let t = resolve("QFP-4").unwrap();
        let corner = Point::new(0.0, 0.0);
        for (w, h) in [(400.0, 100.0), (100.0, 400.0), (200.0, 200.0)] {
            for n in 4..=7 {
                let placed = layout(&t, &numbered_pins(n), w, h, 10.0).unwrap();
                assert_eq!(placed[0].point(), Point::new(10.0, 0.0), "{n} pins at {w}x{h}");
                let d1 = placed[0].point().distance_to(corner);
                assert!(
                    placed[1..].iter().all(|p| p.point().distance_to(corner) >= d1 - 1e-9),
                    "{n} pins at {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn coordinates_on_grid_and_distinct() {
        let t = resolve("PLCC-84").unwrap();
        let placed = layout(&t, &numbered_pins(84), 300.0, 300.0, 10.0).unwrap();
        for p in &placed {
            assert!(is_multiple_of(p.x, 10.0) && is_multiple_of(p.y, 10.0));
            assert!((0.0..=300.0).contains(&p.x) && (0.0..=300.0).contains(&p.y));
        }
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(a.point().distance_to(b.point()) > 1e-9);
            }
        }
    }

    #[test]
    fn remainder_pins_go_to_first_sides() {
        let t = resolve("SOIC-10").unwrap();
        let placed = layout(&t, &numbered_pins(10), 200.0, 200.0, 10.0).unwrap();
        let counts = side_counts(&placed);
        assert_eq!(counts.get(&Side::Top).copied(), Some(3));
        assert_eq!(counts.get(&Side::Right).copied(), Some(3));
        assert_eq!(counts.get(&Side::Bottom).copied(), Some(2));
        assert_eq!(counts.get(&Side::Left).copied(), Some(2));
    }

    #[test]
    fn cramped_quad_reports_capacity() {
        let t = resolve("QFP-100").unwrap();
        let err = layout(&t, &numbered_pins(100), 100.0, 100.0, 10.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidPinCount { count: 25, limit: 9 }));
    }
}
