//! Minimal generic chip rendering used when the primary path fails.
//!
//! The fallback draws a plain labelled rectangle with every declared pin in a
//! single column down the left edge. It never drops pins: when the column
//! does not fit at one grid unit per pin, the pins are spread at the finest
//! spacing the canvas allows instead.

use std::sync::Arc;

use tracing::debug;

use crate::chip::color::Color;
use crate::chip::compose::scene::{Scene, Shape, TextAnchor};
use crate::chip::compose::{
    lead_anchor, push_text, text_size, truncate_name, ComposeOptions, BODY_EDGE, LEAD_COLOR,
};
use crate::chip::descriptor::{ComponentDescriptor, PinSpec};
use crate::chip::error::{RenderError, RenderResult};
use crate::chip::geometry::Rect;
use crate::chip::layout::{LayoutEngine, PositionedPin, Side};
use crate::chip::package::{PackageTopology, MAX_DECLARED_PINS};
use crate::chip::raster::Rasterizer;
use crate::chip::rendered::{Label, LabelRole, RenderedChipImage};

/// Canvas background of fallback images.
pub const FALLBACK_BACKGROUND: Color = Color::rgb(30, 30, 30);

const BODY_FILL: Color = Color::rgb(60, 60, 60);
const BODY_OUTLINE: Color = Color::rgb(110, 110, 110);
const NAME_COLOR: Color = Color::rgb(255, 255, 255);

/// Draws the generic stand-in image.
#[derive(Debug, Clone)]
pub struct FallbackRenderer {
    engine: LayoutEngine,
    options: ComposeOptions,
    rasterizer: Arc<Rasterizer>,
}

impl FallbackRenderer {
    /// Creates a fallback renderer sharing the primary rasteriser.
    #[must_use]
    pub const fn new(
        engine: LayoutEngine,
        options: ComposeOptions,
        rasterizer: Arc<Rasterizer>,
    ) -> Self {
        Self {
            engine,
            options,
            rasterizer,
        }
    }

    /// Renders `descriptor` as a plain rectangle of `width` × `height`.
    ///
    /// `package_type` is recorded on the image as requested; it is not
    /// interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DrawingSurfaceFailure`] if the surface is
    /// unusable, or [`RenderError::InvalidPinCount`] if the pin list is
    /// beyond any sane size.
    pub fn render(
        &self,
        descriptor: &ComponentDescriptor,
        package_type: &str,
        width: u32,
        height: u32,
    ) -> RenderResult<RenderedChipImage> {
        self.rasterizer.check_surface(width, height)?;
        let (w, h) = (f64::from(width), f64::from(height));
        let pins = self.column(&descriptor.pins, w, h)?;

        let mut scene = Scene::new(width, height, self.options.font_family.clone())
            .with_background(FALLBACK_BACKGROUND);
        let left = self.options.lead_length.min(w / 4.0);
        let edge = BODY_EDGE.min(w / 4.0).min(h / 4.0);
        let body = Rect::canvas(w, h).inset(left, edge, edge, edge);

        for pin in &pins {
            if let Some(anchor) = lead_anchor(&body, pin) {
                scene.push(Shape::Line {
                    x1: anchor.x,
                    y1: anchor.y,
                    x2: pin.x,
                    y2: pin.y,
                    stroke: LEAD_COLOR,
                    width: 1.0,
                });
            }
        }
        scene.push(Shape::Rect {
            x: body.min_x,
            y: body.min_y,
            width: body.width(),
            height: body.height(),
            radius: 0.0,
            fill: BODY_FILL,
            stroke: Some((BODY_OUTLINE, 1.0)),
        });
        for pin in &pins {
            scene.push(Shape::Circle {
                cx: pin.x,
                cy: pin.y,
                r: self.options.pin_radius,
                fill: self.options.palette.color_for(pin.class),
                opacity: 1.0,
            });
        }

        let size = text_size(w);
        let centre = body.centre();
        let name = Label {
            role: LabelRole::Name,
            text: truncate_name(&descriptor.name),
            x: centre.x,
            y: centre.y + size / 3.0,
            rotation: 0.0,
            font_size: size,
        };
        push_text(&mut scene, &name, TextAnchor::Middle, NAME_COLOR);

        let svg = scene.to_svg();
        let pixels = self.rasterizer.rasterize(&svg, width, height)?;

        Ok(RenderedChipImage {
            width,
            height,
            pixels,
            svg,
            pins,
            labels: vec![name],
            marker: None,
            topology: None,
            package_type: package_type.to_string(),
            fallback: true,
        })
    }

    /// Lays the pins out in one column, falling back to sub-grid spacing.
    fn column(
        &self,
        pins: &[PinSpec],
        width: f64,
        height: f64,
    ) -> RenderResult<Vec<PositionedPin>> {
        match self.engine.layout(&PackageTopology::fallback(), pins, width, height) {
            Err(RenderError::InvalidPinCount { .. }) => self.fitted_column(pins, height),
            other => other,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn fitted_column(&self, pins: &[PinSpec], height: f64) -> RenderResult<Vec<PositionedPin>> {
        let n = pins.len();
        if n > MAX_DECLARED_PINS {
            return Err(RenderError::InvalidPinCount {
                count: n,
                limit: MAX_DECLARED_PINS,
            });
        }

        let margin = if height > 2.0 * self.engine.margin {
            self.engine.margin
        } else {
            0.0
        };
        let step = if n > 1 {
            2.0f64.mul_add(-margin, height) / (n - 1) as f64
        } else {
            0.0
        };
        debug!(pins = n, step, margin, "fallback column below one grid unit per pin");

        Ok(pins
            .iter()
            .enumerate()
            .map(|(i, pin)| {
                let y = if n == 1 {
                    height / 2.0
                } else {
                    (i as f64).mul_add(step, margin)
                };
                PositionedPin::new(pin, Side::Left, 0.0, y)
            })
            .collect())
    }
}
