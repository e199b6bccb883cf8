//! Error types for chip layout and rendering.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for chip layout and rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while resolving, laying out, or drawing a chip.
///
/// Only the renderer facade recovers from these; every other stage
/// propagates them unchanged.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The package family of a package-type token is not recognised.
    #[error("Unknown package kind: '{token}'")]
    UnknownPackageKind {
        /// The offending package-type token.
        token: String,
    },

    /// The pin count is zero where a count is required, above the configured
    /// ceiling, or too large for the canvas at one grid unit per pin.
    #[error("Invalid pin count {count}: limit is {limit}")]
    InvalidPinCount {
        /// Number of pins requested.
        count: usize,
        /// Largest number of pins that can be accepted.
        limit: usize,
    },

    /// Grid or canvas parameters are unusable (non-finite, negative, zero grid).
    #[error("Invalid layout geometry: {message}")]
    InvalidGeometry {
        /// Description of what's wrong.
        message: String,
    },

    /// The drawing backend could not produce the image.
    #[error("Drawing surface failure: {message}")]
    DrawingSurfaceFailure {
        /// Description of what went wrong.
        message: String,
    },

    /// Both the primary and the fallback rendering paths failed.
    #[error("Fallback rendering failed after primary error ({primary}): {fallback}")]
    FallbackFailed {
        /// Error that sent the render down the fallback path.
        primary: Box<RenderError>,
        /// Error raised by the fallback renderer itself.
        #[source]
        fallback: Box<RenderError>,
    },

    /// PNG encoding failed.
    #[error("Failed to encode image")]
    Encode {
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to write an output file.
    #[error("Failed to write file: {path}")]
    FileWrite {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl RenderError {
    /// Creates an unknown package kind error.
    pub fn unknown_package(token: impl Into<String>) -> Self {
        Self::UnknownPackageKind {
            token: token.into(),
        }
    }

    /// Creates an invalid geometry error.
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Creates a drawing surface failure.
    pub fn surface(message: impl Into<String>) -> Self {
        Self::DrawingSurfaceFailure {
            message: message.into(),
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the facade may substitute the fallback renderer.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownPackageKind { .. }
                | Self::InvalidPinCount { .. }
                | Self::InvalidGeometry { .. }
                | Self::DrawingSurfaceFailure { .. }
        )
    }
}
