//! Chip visual composer.
//!
//! Turns a chip definition plus its laid-out pins into a [`RenderedChipImage`].
//! There is one drawing pipeline for every package; what differs between
//! packages and eras is carried by [`style::EraStyle`] and
//! [`style::BodyStyle`] values.
//!
//! # Silkscreen Layout
//!
//! All text reads bottom-to-top (rotated -90°), as printed on real ICs. With
//! `W` × `H` the canvas size and `fs = clamp(floor(W / 35), 10, 16)`:
//!
//! | Label        | Anchor           | Size           | Condition                  |
//! |--------------|------------------|----------------|----------------------------|
//! | name         | 25 % W, 85 % H   | `fs`, bold     | always                     |
//! | package      | 45 % W, 75 % H   | `max(7, fs-3)` | always                     |
//! | speed        | 65 % W, 70 % H   | `max(7, fs-3)` | speed known                |
//! | manufacturer | 80 % W, 60 % H   | `max(6, fs-4)` | body wider than threshold  |
//!
//! Names longer than 16 characters are cut to 13 plus `...`.

pub mod scene;
pub mod style;

use std::sync::Arc;

use tracing::debug;

use crate::chip::color::{Color, PinPalette};
use crate::chip::descriptor::{ComponentDescriptor, Era, YearValue};
use crate::chip::error::{RenderError, RenderResult};
use crate::chip::geometry::{Point, Rect};
use crate::chip::layout::{PositionedPin, Side};
use crate::chip::package::{PackageTopology, TopologyKind};
use crate::chip::raster::Rasterizer;
use crate::chip::rendered::{Label, LabelRole, MarkerKind, PolarityMarker, RenderedChipImage};
use crate::config::Config;

use scene::{Scene, Shape, TextAnchor};
use style::{BodyStyle, EraStyle};

/// Longest name drawn in full.
const MAX_NAME_CHARS: usize = 16;

/// Characters kept when a name is truncated.
const TRUNCATED_NAME_CHARS: usize = 13;

/// Clearance between the canvas edge and sides of the body without leads.
pub(crate) const BODY_EDGE: f64 = 2.0;

/// Rotation of all silkscreen text.
const TEXT_ROTATION: f64 = -90.0;

/// Lead (pin leg) colour.
pub(crate) const LEAD_COLOR: Color = Color::rgb(192, 192, 192);

/// Pin-1 dot colour.
const DOT_COLOR: Color = Color::rgb(255, 255, 255);

/// Pin-1 dot opacity.
const DOT_OPACITY: f64 = 0.8;

/// Drawing options.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    /// Length of leads on pin-bearing sides.
    pub lead_length: f64,
    /// Radius of pin dots.
    pub pin_radius: f64,
    /// Body width above which the manufacturer label is drawn.
    pub label_width_threshold: f64,
    /// Draw pin names.
    pub pin_labels: bool,
    /// Font family written into the SVG.
    pub font_family: String,
    /// Pin class colours.
    pub palette: PinPalette,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ComposeOptions {
    fn from(config: &Config) -> Self {
        Self {
            lead_length: config.render.lead_length,
            pin_radius: config.render.pin_radius,
            label_width_threshold: config.render.label_width_threshold,
            pin_labels: config.render.pin_labels,
            font_family: config.render.font_family.clone(),
            palette: config.palette.clone(),
        }
    }
}

/// A composed chip before rasterisation.
#[derive(Debug, Clone)]
pub struct ChipDrawing {
    /// Shapes to draw.
    pub scene: Scene,
    /// Text labels, in drawing order.
    pub labels: Vec<Label>,
    /// Pin-1 marker.
    pub marker: PolarityMarker,
    /// Package body outline.
    pub body: Rect,
}

/// Draws chips.
#[derive(Debug, Clone)]
pub struct Composer {
    options: ComposeOptions,
    rasterizer: Arc<Rasterizer>,
}

impl Composer {
    /// Creates a composer drawing through the given rasteriser.
    #[must_use]
    pub const fn new(options: ComposeOptions, rasterizer: Arc<Rasterizer>) -> Self {
        Self {
            options,
            rasterizer,
        }
    }

    /// Returns the drawing options.
    #[must_use]
    pub const fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Composes and rasterises a chip image.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DrawingSurfaceFailure`] if the surface is
    /// unusable or too small for the package body, or if rasterisation fails.
    pub fn compose(
        &self,
        descriptor: &ComponentDescriptor,
        topology: &PackageTopology,
        pins: &[PositionedPin],
        width: u32,
        height: u32,
    ) -> RenderResult<RenderedChipImage> {
        self.rasterizer.check_surface(width, height)?;
        let drawing = self.draw(descriptor, topology, pins, width, height)?;
        let svg = drawing.scene.to_svg();
        let pixels = self.rasterizer.rasterize(&svg, width, height)?;

        Ok(RenderedChipImage {
            width,
            height,
            pixels,
            svg,
            pins: pins.to_vec(),
            labels: drawing.labels,
            marker: Some(drawing.marker),
            topology: Some(*topology),
            package_type: topology.label(),
            fallback: false,
        })
    }

    /// Builds the drawing of a chip without rasterising it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DrawingSurfaceFailure`] if the canvas leaves no
    /// room for the package body.
    pub fn draw(
        &self,
        descriptor: &ComponentDescriptor,
        topology: &PackageTopology,
        pins: &[PositionedPin],
        width: u32,
        height: u32,
    ) -> RenderResult<ChipDrawing> {
        let opts = &self.options;
        let (w, h) = (f64::from(width), f64::from(height));
        let era_style = EraStyle::for_era(descriptor.era.as_ref());
        let body_style = BodyStyle::for_shape(topology.body_shape);
        let body = body_rect(topology.kind, body_style, w, h, opts.lead_length)?;

        debug!(
            chip = %descriptor.name,
            kind = ?topology.kind,
            body_width = body.width(),
            body_height = body.height(),
            "composing chip"
        );

        let mut scene = Scene::new(width, height, opts.font_family.clone());

        // leads go first so the body covers their inner ends
        for pin in pins {
            if let Some(anchor) = lead_anchor(&body, pin) {
                if anchor.distance_to(pin.point()) > f64::EPSILON {
                    scene.push(Shape::Line {
                        x1: anchor.x,
                        y1: anchor.y,
                        x2: pin.x,
                        y2: pin.y,
                        stroke: LEAD_COLOR,
                        width: (opts.pin_radius * 0.8).max(1.0),
                    });
                }
            }
        }

        let radius = body_style
            .corner_radius
            .min(body.width() / 2.0)
            .min(body.height() / 2.0);
        scene.push(Shape::Rect {
            x: body.min_x,
            y: body.min_y,
            width: body.width(),
            height: body.height(),
            radius,
            fill: era_style.body,
            stroke: Some((era_style.outline, 2.0)),
        });

        let marker = polarity_marker(&mut scene, topology.kind, &body, era_style);

        let mut labels = silkscreen_labels(descriptor, &topology.label(), &body, w, h, opts);
        for pin in pins {
            scene.push(Shape::Circle {
                cx: pin.x,
                cy: pin.y,
                r: opts.pin_radius,
                fill: opts.palette.color_for(pin.class),
                opacity: 1.0,
            });
        }
        for label in &labels {
            push_text(&mut scene, label, TextAnchor::Start, era_style.text);
        }

        if opts.pin_labels {
            let size = (text_size(w) * 0.6).max(6.0);
            for (label, anchor) in pins.iter().filter_map(|pin| pin_label(pin, &body, size)) {
                push_text(&mut scene, &label, anchor, era_style.text);
                labels.push(label);
            }
        }

        Ok(ChipDrawing {
            scene,
            labels,
            marker,
            body,
        })
    }
}

/// Computes the package body inside a `w` × `h` canvas.
fn body_rect(
    kind: TopologyKind,
    style: BodyStyle,
    w: f64,
    h: f64,
    lead: f64,
) -> RenderResult<Rect> {
    let (left, top, right, bottom) = match kind {
        TopologyKind::DualInLine => (lead, BODY_EDGE, lead, BODY_EDGE),
        TopologyKind::QuadSide => (lead, lead, lead, lead),
        TopologyKind::GridArray => (BODY_EDGE, BODY_EDGE, BODY_EDGE, BODY_EDGE),
        TopologyKind::SingleRow | TopologyKind::Connector | TopologyKind::Module => {
            (lead, BODY_EDGE, BODY_EDGE, BODY_EDGE)
        }
    };
    let narrowing = style.narrowing * w;
    let body = Rect::canvas(w, h).inset(left + narrowing, top, right + narrowing, bottom);
    if body.width() <= 0.0 || body.height() <= 0.0 {
        return Err(RenderError::surface(format!(
            "{w}x{h} canvas leaves no room for the package body"
        )));
    }
    Ok(body)
}

/// Returns where a pin's lead meets the body, or `None` for pins under it.
pub(crate) fn lead_anchor(body: &Rect, pin: &PositionedPin) -> Option<Point> {
    let clamp_x = pin.x.clamp(body.min_x, body.max_x);
    let clamp_y = pin.y.clamp(body.min_y, body.max_y);
    match pin.side {
        Side::Left => Some(Point::new(body.min_x, clamp_y)),
        Side::Right => Some(Point::new(body.max_x, clamp_y)),
        Side::Top => Some(Point::new(clamp_x, body.min_y)),
        Side::Bottom => Some(Point::new(clamp_x, body.max_y)),
        Side::None => None,
    }
}

/// Draws the pin-1 marker and returns its placement.
fn polarity_marker(
    scene: &mut Scene,
    kind: TopologyKind,
    body: &Rect,
    style: EraStyle,
) -> PolarityMarker {
    if kind == TopologyKind::DualInLine {
        let cx = body.centre().x;
        let top = body.min_y;
        let rx = (0.075 * body.width()).min(20.0);
        let ry = (body.height() / 4.0).min(7.5);
        // sweep flag 0 bulges the arc down into the body
        scene.push(Shape::Path {
            d: format!(
                "M {:.2} {top:.2} A {rx:.2} {ry:.2} 0 0 0 {:.2} {top:.2} Z",
                cx - rx,
                cx + rx
            ),
            fill: style.notch,
        });
        PolarityMarker {
            kind: MarkerKind::Notch,
            x: cx,
            y: top,
        }
    } else {
        let inset = (body.width() / 4.0).min(body.height() / 4.0).min(16.0);
        let (x, y) = (body.min_x + inset, body.min_y + inset);
        scene.push(Shape::Circle {
            cx: x,
            cy: y,
            r: inset.min(4.0),
            fill: DOT_COLOR,
            opacity: DOT_OPACITY,
        });
        PolarityMarker {
            kind: MarkerKind::Dot,
            x,
            y,
        }
    }
}

/// Base font size for a canvas of width `w`.
pub(crate) fn text_size(w: f64) -> f64 {
    (w / 35.0).floor().clamp(10.0, 16.0)
}

/// Cuts long names to 13 characters plus `...`.
#[must_use]
pub fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_CHARS {
        let mut short: String = name.chars().take(TRUNCATED_NAME_CHARS).collect();
        short.push_str("...");
        short
    } else {
        name.to_string()
    }
}

/// Shortens a manufacturer name for the silkscreen.
#[must_use]
pub fn abbreviate_manufacturer(manufacturer: &str) -> String {
    let upper = manufacturer.to_uppercase();
    if upper.contains("MOTOROLA") {
        "MOTOROLA".to_string()
    } else if upper.contains("COMMODORE") {
        "COMMODORE".to_string()
    } else if manufacturer.contains("MOS") {
        "MOS".to_string()
    } else {
        manufacturer.chars().take(8).collect()
    }
}

/// Builds the manufacturer line: abbreviated maker and year, when known.
fn manufacturer_line(era: &Era) -> Option<String> {
    let maker = era
        .manufacturer
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(abbreviate_manufacturer);
    let year = era.year.as_ref().and_then(|y| match y {
        YearValue::Number(n) => Some(n.to_string()),
        YearValue::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
    });
    match (maker, year) {
        (Some(m), Some(y)) => Some(format!("{m} {y}")),
        (Some(m), None) => Some(m),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}

fn silkscreen_labels(
    descriptor: &ComponentDescriptor,
    package: &str,
    body: &Rect,
    w: f64,
    h: f64,
    opts: &ComposeOptions,
) -> Vec<Label> {
    let fs = text_size(w);
    let small = (fs - 3.0).max(7.0);
    let tiny = (fs - 4.0).max(6.0);
    let label = |role, text: String, fx: f64, fy: f64, font_size| Label {
        role,
        text,
        x: w * fx,
        y: h * fy,
        rotation: TEXT_ROTATION,
        font_size,
    };

    let mut labels = vec![label(
        LabelRole::Name,
        truncate_name(&descriptor.name),
        0.25,
        0.85,
        fs,
    )];
    if !package.is_empty() {
        labels.push(label(LabelRole::Package, package.to_string(), 0.45, 0.75, small));
    }

    let Some(era) = descriptor.era.as_ref() else {
        return labels;
    };
    if let Some(speed) = era.speed.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        labels.push(label(LabelRole::Speed, speed.to_string(), 0.65, 0.7, small));
    }
    if body.width() > opts.label_width_threshold {
        if let Some(text) = manufacturer_line(era) {
            labels.push(label(LabelRole::Manufacturer, text, 0.8, 0.6, tiny));
        }
    }
    labels
}

/// Places a pin name just inside the body edge next to its pin.
///
/// Right-edge labels end at their anchor and top-edge labels hang down from
/// it, so every pin name reads into the body.
fn pin_label(pin: &PositionedPin, body: &Rect, size: f64) -> Option<(Label, TextAnchor)> {
    let pad = 3.0;
    let nudge = size / 3.0;
    let (x, y, rotation, anchor) = match pin.side {
        Side::Left => (body.min_x + pad, pin.y + nudge, 0.0, TextAnchor::Start),
        Side::Right => (body.max_x - pad, pin.y + nudge, 0.0, TextAnchor::End),
        Side::Top => (pin.x + nudge, body.min_y + pad, TEXT_ROTATION, TextAnchor::End),
        Side::Bottom => (pin.x + nudge, body.max_y - pad, TEXT_ROTATION, TextAnchor::Start),
        Side::None => return None,
    };
    let label = Label {
        role: LabelRole::Pin,
        text: pin.pin.name.clone(),
        x,
        y,
        rotation,
        font_size: size,
    };
    Some((label, anchor))
}

pub(crate) fn push_text(scene: &mut Scene, label: &Label, anchor: TextAnchor, fill: Color) {
    scene.push(Shape::Text {
        x: label.x,
        y: label.y,
        text: label.text.clone(),
        size: label.font_size,
        fill,
        rotation: label.rotation,
        anchor,
        bold: label.role == LabelRole::Name,
    });
}
