//! Drawing primitives and their SVG serialisation.
//!
//! The composer describes a chip as a flat list of [`Shape`]s. The scene is
//! serialised to SVG, which the rasteriser turns into pixels and which is
//! also kept for vector export.

use std::fmt::Write;

use crate::chip::color::Color;

/// Horizontal text anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// Text starts at the anchor point.
    Start,
    /// Text is centred on the anchor point.
    Middle,
    /// Text ends at the anchor point.
    End,
}

impl TextAnchor {
    const fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// A single drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled rectangle with optional outline.
    Rect {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Corner radius.
        radius: f64,
        /// Fill colour.
        fill: Color,
        /// Outline colour and width.
        stroke: Option<(Color, f64)>,
    },
    /// Filled circle.
    Circle {
        /// Centre X.
        cx: f64,
        /// Centre Y.
        cy: f64,
        /// Radius.
        r: f64,
        /// Fill colour.
        fill: Color,
        /// Fill opacity in `0.0..=1.0`.
        opacity: f64,
    },
    /// Straight stroked line.
    Line {
        /// Start X.
        x1: f64,
        /// Start Y.
        y1: f64,
        /// End X.
        x2: f64,
        /// End Y.
        y2: f64,
        /// Stroke colour.
        stroke: Color,
        /// Stroke width.
        width: f64,
    },
    /// Filled SVG path.
    Path {
        /// Path data.
        d: String,
        /// Fill colour.
        fill: Color,
    },
    /// Text, optionally rotated about its anchor point.
    Text {
        /// Anchor X.
        x: f64,
        /// Anchor Y.
        y: f64,
        /// Text content (unescaped).
        text: String,
        /// Font size.
        size: f64,
        /// Fill colour.
        fill: Color,
        /// Rotation in degrees (negative is counter-clockwise).
        rotation: f64,
        /// Horizontal anchoring.
        anchor: TextAnchor,
        /// Bold weight.
        bold: bool,
    },
}

/// A complete drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Background fill, transparent when `None`.
    pub background: Option<Color>,
    /// Font family applied to all text.
    pub font_family: String,
    /// Shapes in paint order.
    pub shapes: Vec<Shape>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new(width: u32, height: u32, font_family: impl Into<String>) -> Self {
        Self {
            width,
            height,
            background: None,
            font_family: font_family.into(),
            shapes: Vec::new(),
        }
    }

    /// Sets the background fill.
    #[must_use]
    pub const fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Appends a shape.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Serialises the scene to an SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(256 + self.shapes.len() * 96);
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        if let Some(bg) = self.background {
            let _ = writeln!(
                svg,
                r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
                self.width,
                self.height,
                bg.to_hex()
            );
        }
        for shape in &self.shapes {
            self.write_shape(&mut svg, shape);
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn write_shape(&self, svg: &mut String, shape: &Shape) {
        match shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
                radius,
                fill,
                stroke,
            } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}""#,
                    num(*x),
                    num(*y),
                    num(*width),
                    num(*height),
                    num(*radius),
                    fill.to_hex()
                );
                if let Some((color, w)) = stroke {
                    let _ = write!(
                        svg,
                        r#" stroke="{}" stroke-width="{}""#,
                        color.to_hex(),
                        num(*w)
                    );
                }
                svg.push_str("/>\n");
            }
            Shape::Circle {
                cx,
                cy,
                r,
                fill,
                opacity,
            } => {
                let _ = write!(
                    svg,
                    r#"<circle cx="{}" cy="{}" r="{}" fill="{}""#,
                    num(*cx),
                    num(*cy),
                    num(*r),
                    fill.to_hex()
                );
                if *opacity < 1.0 {
                    let _ = write!(svg, r#" fill-opacity="{}""#, num(*opacity));
                }
                svg.push_str("/>\n");
            }
            Shape::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
                width,
            } => {
                let _ = writeln!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
                    num(*x1),
                    num(*y1),
                    num(*x2),
                    num(*y2),
                    stroke.to_hex(),
                    num(*width)
                );
            }
            Shape::Path { d, fill } => {
                let _ = writeln!(svg, r#"<path d="{}" fill="{}"/>"#, escape_xml(d), fill.to_hex());
            }
            Shape::Text {
                x,
                y,
                text,
                size,
                fill,
                rotation,
                anchor,
                bold,
            } => {
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-anchor="{}""#,
                    num(*x),
                    num(*y),
                    escape_xml(&self.font_family),
                    num(*size),
                    fill.to_hex(),
                    anchor.as_svg()
                );
                if *bold {
                    svg.push_str(r#" font-weight="bold""#);
                }
                if rotation.abs() > f64::EPSILON {
                    let _ = write!(
                        svg,
                        r#" transform="rotate({} {} {})""#,
                        num(*rotation),
                        num(*x),
                        num(*y)
                    );
                }
                let _ = writeln!(svg, ">{}</text>", escape_xml(text));
            }
        }
    }
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
fn num(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escapes text for inclusion in SVG markup.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
