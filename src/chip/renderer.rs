//! Renderer facade.
//!
//! [`Renderer`] runs the primary pipeline (resolve the package, lay out the
//! pins, compose the image) and substitutes the fallback rendering when any
//! stage fails. It is the only place where render errors are swallowed.
//!
//! Finished images are memoised by component, package and size. The facade
//! is `Send + Sync`; share it behind an [`Arc`] to render from many threads.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::chip::cache::{CacheKey, RenderCache};
use crate::chip::compose::{ComposeOptions, Composer};
use crate::chip::descriptor::ComponentDescriptor;
use crate::chip::error::{RenderError, RenderResult};
use crate::chip::fallback::FallbackRenderer;
use crate::chip::layout::LayoutEngine;
use crate::chip::package::resolve;
use crate::chip::raster::{FontOptions, Rasterizer};
use crate::chip::rendered::RenderedChipImage;
use crate::config::Config;

/// Renders chip images with fallback and memoisation.
pub struct Renderer {
    engine: LayoutEngine,
    composer: Composer,
    fallback: FallbackRenderer,
    default_size: (u32, u32),
    cache: Option<RenderCache>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("engine", &self.engine)
            .field("default_size", &self.default_size)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Builds a renderer from configuration.
    ///
    /// Fonts are loaded here, once, and shared by every render.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let fonts = FontOptions {
            family: config.render.font_family.clone(),
            dirs: config.render.font_dirs.clone(),
            load_system_fonts: config.render.load_system_fonts,
        };
        let rasterizer = Arc::new(Rasterizer::new(&fonts, config.render.max_dimension));
        Self::with_rasterizer(config, rasterizer)
    }

    /// Builds a renderer drawing through an existing rasteriser.
    #[must_use]
    pub fn with_rasterizer(config: &Config, rasterizer: Arc<Rasterizer>) -> Self {
        let engine = LayoutEngine::from(&config.layout);
        let options = ComposeOptions::from(config);
        Self {
            engine,
            composer: Composer::new(options.clone(), Arc::clone(&rasterizer)),
            fallback: FallbackRenderer::new(engine, options, rasterizer),
            default_size: (config.render.default_width, config.render.default_height),
            cache: config.render.cache.then(RenderCache::new),
        }
    }

    /// Returns the layout engine used by the primary path.
    #[must_use]
    pub const fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Picks the image size for `descriptor`.
    ///
    /// An explicit request wins, then the descriptor's own width and height,
    /// then the configured default.
    #[must_use]
    pub fn target_size(
        &self,
        descriptor: &ComponentDescriptor,
        requested: Option<(u32, u32)>,
    ) -> (u32, u32) {
        requested.unwrap_or((
            descriptor.width.unwrap_or(self.default_size.0),
            descriptor.height.unwrap_or(self.default_size.1),
        ))
    }

    /// Renders `descriptor` with its own package and size.
    ///
    /// # Errors
    ///
    /// See [`Renderer::render`].
    pub fn render_default(
        &self,
        descriptor: &ComponentDescriptor,
    ) -> RenderResult<Arc<RenderedChipImage>> {
        let package = descriptor.package_type.as_deref().unwrap_or_default();
        self.render(descriptor, package, self.target_size(descriptor, None))
    }

    /// Renders `descriptor` as `package_type` at `size`.
    ///
    /// Failures of the primary path are logged and replaced by the fallback
    /// image, so a bad package token or an overfull canvas still yields an
    /// image carrying every declared pin.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::FallbackFailed`] only when the fallback
    /// rendering fails too.
    pub fn render(
        &self,
        descriptor: &ComponentDescriptor,
        package_type: &str,
        size: (u32, u32),
    ) -> RenderResult<Arc<RenderedChipImage>> {
        let Some(cache) = &self.cache else {
            return self.render_uncached(descriptor, package_type, size).map(Arc::new);
        };
        let key = CacheKey::for_descriptor(descriptor, package_type, size);
        cache.get_or_try_insert_with(key, || self.render_uncached(descriptor, package_type, size))
    }

    /// Renders through the primary pipeline only, without fallback or cache.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by resolution, layout or composition.
    pub fn render_primary(
        &self,
        descriptor: &ComponentDescriptor,
        package_type: &str,
        size: (u32, u32),
    ) -> RenderResult<RenderedChipImage> {
        let topology = resolve(package_type)?;
        if let Some(declared) = topology.pin_count {
            if declared != descriptor.pins.len() {
                warn!(
                    chip = %descriptor.name,
                    package = package_type,
                    declared,
                    pins = descriptor.pins.len(),
                    "package pin count disagrees with the chip definition"
                );
            }
        }

        let (width, height) = size;
        let pins = self.engine.layout(
            &topology,
            &descriptor.pins,
            f64::from(width),
            f64::from(height),
        )?;
        self.composer.compose(descriptor, &topology, &pins, width, height)
    }

    fn render_uncached(
        &self,
        descriptor: &ComponentDescriptor,
        package_type: &str,
        size: (u32, u32),
    ) -> RenderResult<RenderedChipImage> {
        match self.render_primary(descriptor, package_type, size) {
            Ok(image) => {
                debug!(chip = %descriptor.name, package = package_type, "rendered chip");
                Ok(image)
            }
            Err(primary) => {
                if primary.is_recoverable() {
                    warn!(
                        chip = %descriptor.name,
                        package = package_type,
                        error = %primary,
                        "primary render failed, using fallback"
                    );
                } else {
                    error!(
                        chip = %descriptor.name,
                        package = package_type,
                        error = %primary,
                        "unexpected render failure, using fallback"
                    );
                }
                self.fallback
                    .render(descriptor, package_type, size.0, size.1)
                    .map_err(|fallback| RenderError::FallbackFailed {
                        primary: Box::new(primary),
                        fallback: Box::new(fallback),
                    })
            }
        }
    }

    /// Number of cached images.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.as_ref().map_or(0, RenderCache::len)
    }

    /// Drops every cached image.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}
