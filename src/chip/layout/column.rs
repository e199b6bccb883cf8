//! Single-column layout for SIPs, passives, connectors and modules.

use crate::chip::descriptor::PinSpec;
use crate::chip::error::RenderResult;
use crate::chip::layout::{Grid, PinArranger, PositionedPin, Side};

/// Arranger placing every pin in one column at the left edge.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnArranger;

impl PinArranger for ColumnArranger {
    fn arrange(
        &self,
        grid: Grid,
        pins: &[PinSpec],
        _width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>> {
        let ys = grid.spread(pins.len(), height)?;
        Ok(pins
            .iter()
            .zip(ys)
            .map(|(pin, y)| PositionedPin::new(pin, Side::Left, 0.0, y))
            .collect())
    }
}
