//! retro-chip-renderer: package layout and rendering for retro-computer chips
//!
//! This library turns abstract chip definitions (name, category, ordered pin
//! list, era) into physically plausible pin layouts and labelled chip images.
//!
//! # Architecture
//!
//! - **Package resolution**: `DIP-40`, `QFP-64`, `BGA-352`, `Card Edge` map to
//!   a pin topology and body shape
//! - **Pin layout**: every pin gets a side and a grid-snapped coordinate
//! - **Composition**: body, pin-1 marker, leads, colour-coded pin dots and
//!   rotated silkscreen text, styled by package and era
//! - **Facade**: runs the pipeline, degrades to a plain fallback image on any
//!   failure, and memoises results
//!
//! # Modules
//!
//! - [`chip`] — Package geometry, layout, composition and rendering
//! - [`catalog`] — Concurrent batch rendering of a directory of chip definitions
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types for configuration, chip definitions and catalogue runs
//!
//! # Example
//!
//! ```no_run
//! use retro_chip_renderer::chip::{ComponentDescriptor, Renderer};
//! use retro_chip_renderer::config::Config;
//!
//! let z80 = ComponentDescriptor::from_json(
//!     r#"{"name": "Z80 CPU", "category": "Processor", "pins": ["A11", "A12", "A13"]}"#,
//! )?;
//! let renderer = Renderer::new(&Config::default());
//! let image = renderer.render(&z80, "DIP-40", (240, 260))?;
//! image.save_png(std::path::Path::new("z80.png"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod chip;
pub mod config;
pub mod error;
