//! Chip package geometry and rendering.
//!
//! This module turns an abstract chip definition into a labelled chip image:
//!
//! - [`package`] — package-type tokens (`DIP-40`, `PLCC-84`, `Card Edge`) to topologies
//! - [`layout`] — pin sides and grid-snapped coordinates per topology
//! - [`color`] — pin name classification and the pin colour palette
//! - [`compose`] — package body, pin-1 marker, leads, pin dots and silkscreen text
//! - [`renderer`] — the facade running the pipeline, with fallback and caching
//!
//! # Pipeline
//!
//! ```text
//! descriptor + token ──resolve──▶ topology ──layout──▶ pins ──compose──▶ image
//!                                      │                 │
//!                                      └──── any error ──┴──▶ fallback image
//! ```
//!
//! Everything up to [`compose`] is pure. The layout engine can be called on
//! its own; the [`alignment`] checker uses it to correct stored pin
//! positions.

pub mod alignment;
pub mod cache;
pub mod color;
pub mod compose;
pub mod descriptor;
pub mod error;
pub mod fallback;
pub mod geometry;
pub mod layout;
pub mod package;
pub mod raster;
pub mod rendered;
pub mod renderer;

pub use descriptor::{ComponentDescriptor, PinSpec};
pub use error::{RenderError, RenderResult};
pub use layout::{LayoutEngine, PositionedPin, Side};
pub use package::{resolve, PackageTopology, TopologyKind};
pub use rendered::RenderedChipImage;
pub use renderer::Renderer;
