//! The finished chip image and its placement metadata.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use serde::Serialize;

use crate::chip::error::{RenderError, RenderResult};
use crate::chip::layout::PositionedPin;
use crate::chip::package::PackageTopology;

/// What a label shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelRole {
    /// Component display name.
    Name,
    /// Package-type token.
    Package,
    /// Clock speed.
    Speed,
    /// Manufacturer and year.
    Manufacturer,
    /// A pin name.
    Pin,
}

/// A text label as placed on the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    /// What the label shows.
    pub role: LabelRole,
    /// Text as drawn (after truncation or abbreviation).
    pub text: String,
    /// Anchor X.
    pub x: f64,
    /// Anchor Y.
    pub y: f64,
    /// Rotation in degrees about the anchor.
    pub rotation: f64,
    /// Font size.
    pub font_size: f64,
}

/// Pin-1 marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Half-moon notch in the top edge.
    Notch,
    /// Small dot near the top-left corner.
    Dot,
}

/// Placement of the pin-1 marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolarityMarker {
    /// Marker style.
    pub kind: MarkerKind,
    /// Marker centre X.
    pub x: f64,
    /// Marker centre Y.
    pub y: f64,
}

/// A rendered chip: RGBA pixels plus everything used to draw them.
#[derive(Debug, Clone)]
pub struct RenderedChipImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA pixels.
    pub pixels: RgbaImage,
    /// SVG document the pixels were rasterised from.
    pub svg: String,
    /// Pins in declared order, as placed on the image.
    pub pins: Vec<PositionedPin>,
    /// Text labels.
    pub labels: Vec<Label>,
    /// Pin-1 marker, absent on fallback images.
    pub marker: Option<PolarityMarker>,
    /// Resolved topology, absent on fallback images.
    pub topology: Option<PackageTopology>,
    /// Package-type token the image was requested for.
    pub package_type: String,
    /// Whether the fallback renderer produced this image.
    pub fallback: bool,
}

impl RenderedChipImage {
    /// Returns the first label with the given role.
    #[must_use]
    pub fn label(&self, role: LabelRole) -> Option<&Label> {
        self.labels.iter().find(|l| l.role == role)
    }

    /// Encodes the image as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if encoding fails.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|source| RenderError::Encode { source })?;
        Ok(buf.into_inner())
    }

    /// Writes the image to a PNG file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        let bytes = self.to_png()?;
        std::fs::write(path, bytes).map_err(|e| RenderError::file_write(path, e))
    }

    /// Writes the SVG source to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn save_svg(&self, path: &Path) -> RenderResult<()> {
        std::fs::write(path, &self.svg).map_err(|e| RenderError::file_write(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> RenderedChipImage {
        RenderedChipImage {
            width,
            height,
            pixels: RgbaImage::new(width, height),
            svg: String::from("<svg/>"),
            pins: Vec::new(),
            labels: vec![Label {
                role: LabelRole::Name,
                text: "Z80".to_string(),
                x: 1.0,
                y: 2.0,
                rotation: -90.0,
                font_size: 10.0,
            }],
            marker: None,
            topology: None,
            package_type: "DIP-40".to_string(),
            fallback: false,
        }
    }

    #[test]
    fn png_has_signature() {
        let png = blank(4, 3).to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn save_png_reports_path() {
        let err = blank(2, 2)
            .save_png(Path::new("/definitely/not/here/chip.png"))
            .unwrap_err();
        assert!(err.to_string().contains("chip.png"));
    }

    #[test]
    fn label_lookup() {
        let img = blank(2, 2);
        assert_eq!(img.label(LabelRole::Name).map(|l| l.text.as_str()), Some("Z80"));
        assert!(img.label(LabelRole::Speed).is_none());
    }
}
