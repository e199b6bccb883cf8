//! Error types for configuration, chip definition files, and catalogue runs.
//!
//! Layout and rendering errors live in [`crate::chip::error`].

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while loading a chip definition.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Descriptor file could not be read.
    #[error("failed to read component descriptor: {path}")]
    Read {
        /// Path to the descriptor file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Descriptor JSON is malformed or fails validation.
    #[error("invalid component descriptor{}", describe_path(.path.as_deref()))]
    Parse {
        /// Path to the descriptor file, if it came from disk.
        path: Option<PathBuf>,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur during a catalogue run.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The discovery pattern is not a valid glob.
    #[error("invalid descriptor pattern: {pattern}")]
    Pattern {
        /// The pattern as given.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory: {path}")]
    OutputDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV report could not be written.
    #[error("failed to write catalogue report: {path}")]
    Report {
        /// Report path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

fn describe_path(path: Option<&Path>) -> String {
    path.map(|p| format!(": {}", p.display())).unwrap_or_default()
}
