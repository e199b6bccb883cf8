//! SVG rasterisation.
//!
//! Scenes are parsed with `usvg` and painted with `resvg` into a `tiny-skia`
//! pixmap, which is then demultiplied into a straight-alpha [`RgbaImage`].
//! The font database is built once and shared by every render.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::chip::error::{RenderError, RenderResult};

/// Font sources for text rendering.
#[derive(Debug, Clone)]
pub struct FontOptions {
    /// Preferred family for all labels.
    pub family: String,
    /// Extra directories scanned for font files.
    pub dirs: Vec<std::path::PathBuf>,
    /// Load the fonts installed on the system.
    pub load_system_fonts: bool,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            dirs: Vec::new(),
            load_system_fonts: true,
        }
    }
}

/// Turns SVG documents into RGBA images.
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
    font_family: String,
    max_dimension: u32,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("faces", &self.fontdb.len())
            .field("font_family", &self.font_family)
            .field("max_dimension", &self.max_dimension)
            .finish()
    }
}

impl Rasterizer {
    /// Builds a rasteriser, loading fonts once.
    #[must_use]
    pub fn new(fonts: &FontOptions, max_dimension: u32) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if fonts.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &fonts.dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        if db.is_empty() {
            warn!("no fonts loaded, chip labels will not be drawn");
        } else {
            debug!(faces = db.len(), "font database ready");
        }

        Self {
            fontdb: Arc::new(db),
            font_family: fonts.family.clone(),
            max_dimension,
        }
    }

    /// Returns the largest accepted image side.
    #[must_use]
    pub const fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Checks that a `width` × `height` surface can be allocated.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DrawingSurfaceFailure`] for zero or oversized
    /// dimensions.
    pub fn check_surface(&self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::surface(format!(
                "zero-sized surface {width}x{height}"
            )));
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(RenderError::surface(format!(
                "surface {width}x{height} exceeds {max}x{max}",
                max = self.max_dimension
            )));
        }
        Ok(())
    }

    /// Rasterises an SVG document onto a `width` × `height` image.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DrawingSurfaceFailure`] if the surface size is
    /// unusable, the SVG cannot be parsed, or the pixmap cannot be allocated.
    pub fn rasterize(&self, svg: &str, width: u32, height: u32) -> RenderResult<RgbaImage> {
        self.check_surface(width, height)?;

        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_family: self.font_family.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| RenderError::surface(format!("failed to parse chip SVG: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| RenderError::surface(format!("failed to allocate {width}x{height} pixmap")))?;

        #[allow(clippy::cast_precision_loss)]
        let transform = resvg::tiny_skia::Transform::from_scale(
            width as f32 / tree.size().width(),
            height as f32 / tree.size().height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let straight: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();

        RgbaImage::from_raw(width, height, straight)
            .ok_or_else(|| RenderError::surface("pixel buffer does not match surface size"))
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        warn!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to load font");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rasterizer() -> Rasterizer {
        let fonts = FontOptions {
            load_system_fonts: false,
            ..FontOptions::default()
        };
        Rasterizer::new(&fonts, 1024)
    }

    #[test]
    fn paints_filled_rect() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10">
<rect x="0" y="0" width="20" height="10" fill="#ff0000"/>
</svg>"##;
        let img = rasterizer().rasterize(svg, 20, 10).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        let p = img.get_pixel(10, 5);
        assert_eq!(p.0, [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_where_nothing_is_drawn() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8" viewBox="0 0 8 8"></svg>"#;
        let img = rasterizer().rasterize(svg, 8, 8).unwrap();
        assert_eq!(img.get_pixel(4, 4).0[3], 0);
    }

    #[test]
    fn rejects_bad_surfaces() {
        let r = rasterizer();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"></svg>"#;
        assert!(matches!(
            r.rasterize(svg, 0, 8),
            Err(RenderError::DrawingSurfaceFailure { .. })
        ));
        assert!(matches!(
            r.rasterize(svg, 2048, 8),
            Err(RenderError::DrawingSurfaceFailure { .. })
        ));
        assert!(matches!(
            r.rasterize("not svg", 8, 8),
            Err(RenderError::DrawingSurfaceFailure { .. })
        ));
    }
}
