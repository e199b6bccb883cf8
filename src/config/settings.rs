//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::chip::color::PinPalette;
use crate::chip::layout::{LayoutEngine, DEFAULT_GRID_SIZE, DEFAULT_MARGIN, DEFAULT_MAX_PINS};
use crate::chip::package::MAX_DECLARED_PINS;
use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Pin layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Drawing and rasterisation settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Pin class colours.
    #[serde(default)]
    pub palette: PinPalette,

    /// Batch rendering settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::ValidationError { message });

        let layout = &self.layout;
        if !layout.grid_size.is_finite() || layout.grid_size <= 0.0 {
            return invalid(format!(
                "layout.grid_size must be positive, got {}",
                layout.grid_size
            ));
        }
        if !layout.margin.is_finite() || layout.margin < 0.0 {
            return invalid(format!(
                "layout.margin must be non-negative, got {}",
                layout.margin
            ));
        }
        if layout.max_pins == 0 || layout.max_pins > MAX_DECLARED_PINS {
            return invalid(format!(
                "layout.max_pins must be between 1 and {MAX_DECLARED_PINS}, got {}",
                layout.max_pins
            ));
        }

        let render = &self.render;
        if render.max_dimension == 0 {
            return invalid("render.max_dimension must be positive".to_string());
        }
        if render.default_width == 0
            || render.default_height == 0
            || render.default_width > render.max_dimension
            || render.default_height > render.max_dimension
        {
            return invalid(format!(
                "render default size {}x{} must be between 1 and {}",
                render.default_width, render.default_height, render.max_dimension
            ));
        }
        for (name, value) in [
            ("render.lead_length", render.lead_length),
            ("render.pin_radius", render.pin_radius),
            ("render.label_width_threshold", render.label_width_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be non-negative, got {value}"));
            }
        }
        if render.font_family.trim().is_empty() {
            return invalid("render.font_family cannot be empty".to_string());
        }

        if self.catalog.jobs == 0 {
            return invalid("catalog.jobs must be at least 1".to_string());
        }
        if let Err(e) = glob::Pattern::new(&self.catalog.pattern) {
            return invalid(format!(
                "catalog.pattern '{}' is not a valid glob: {e}",
                self.catalog.pattern
            ));
        }

        Ok(())
    }
}

/// Pin layout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Grid unit every pin coordinate snaps to.
    /// Default: 10
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,

    /// Clearance kept at both ends of every pin row.
    /// Default: 10
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Largest pin list the engine accepts.
    /// Default: 2048
    #[serde(default = "default_max_pins")]
    pub max_pins: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            margin: default_margin(),
            max_pins: default_max_pins(),
        }
    }
}

impl From<&LayoutConfig> for LayoutEngine {
    fn from(config: &LayoutConfig) -> Self {
        Self::new(config.grid_size, config.margin, config.max_pins)
    }
}

const fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

const fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

const fn default_max_pins() -> usize {
    DEFAULT_MAX_PINS
}

/// Drawing and rasterisation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Image width when neither the caller nor the chip definition gives one.
    #[serde(default = "default_image_size")]
    pub default_width: u32,

    /// Image height when neither the caller nor the chip definition gives one.
    #[serde(default = "default_image_size")]
    pub default_height: u32,

    /// Length of the leads between the body and the pin dots.
    #[serde(default = "default_lead_length")]
    pub lead_length: f64,

    /// Radius of the pin dots.
    #[serde(default = "default_pin_radius")]
    pub pin_radius: f64,

    /// Font family for all labels.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` fonts.
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,

    /// Load the fonts installed on the system.
    #[serde(default = "default_true")]
    pub load_system_fonts: bool,

    /// Body width above which the manufacturer label is drawn.
    #[serde(default = "default_label_width_threshold")]
    pub label_width_threshold: f64,

    /// Draw pin names next to the pins.
    #[serde(default)]
    pub pin_labels: bool,

    /// Memoise rendered images by component, package and size.
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Largest accepted image side in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_width: default_image_size(),
            default_height: default_image_size(),
            lead_length: default_lead_length(),
            pin_radius: default_pin_radius(),
            font_family: default_font_family(),
            font_dirs: Vec::new(),
            load_system_fonts: default_true(),
            label_width_threshold: default_label_width_threshold(),
            pin_labels: false,
            cache: default_true(),
            max_dimension: default_max_dimension(),
        }
    }
}

const fn default_image_size() -> u32 {
    400
}

const fn default_lead_length() -> f64 {
    12.0
}

const fn default_pin_radius() -> f64 {
    3.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

const fn default_label_width_threshold() -> f64 {
    300.0
}

const fn default_max_dimension() -> u32 {
    8192
}

const fn default_true() -> bool {
    true
}

/// Batch rendering configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Number of chips rendered concurrently.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// File name pattern of chip definitions.
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            pattern: default_pattern(),
        }
    }
}

const fn default_jobs() -> usize {
    4
}

fn default_pattern() -> String {
    "*.json".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::color::Color;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert!((config.layout.grid_size - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.render.default_width, 400);
        assert!(config.render.cache);
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "layout": {
                "grid_size": 5,
                "margin": 15,
                "max_pins": 512
            },
            "render": {
                "default_width": 320,
                "default_height": 240,
                "lead_length": 8,
                "pin_radius": 2.5,
                "font_family": "DejaVu Sans",
                "font_dirs": ["/usr/share/fonts/truetype"],
                "load_system_fonts": false,
                "label_width_threshold": 250,
                "pin_labels": true,
                "cache": false,
                "max_dimension": 4096
            },
            "palette": {
                "power": [200, 0, 0]
            },
            "catalog": {
                "jobs": 8,
                "pattern": "**/*.chip.json"
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert!((config.layout.grid_size - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.layout.max_pins, 512);
        assert_eq!(config.render.default_height, 240);
        assert_eq!(config.render.font_family, "DejaVu Sans");
        assert_eq!(config.render.font_dirs.len(), 1);
        assert!(!config.render.load_system_fonts);
        assert!(config.render.pin_labels);
        assert!(!config.render.cache);
        assert_eq!(config.palette.power, Color::rgb(200, 0, 0));
        // unspecified palette entries keep their defaults
        assert_eq!(config.palette.ground, PinPalette::default().ground);
        assert_eq!(config.catalog.jobs, 8);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn layout_config_builds_engine() {
        let engine = LayoutEngine::from(&LayoutConfig::default());
        assert_eq!(engine, LayoutEngine::default());
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_bad_grid() {
        let config: Config = serde_json::from_str(r#"{"layout": {"grid_size": 0}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("grid_size"));
    }

    #[test]
    fn reject_oversized_default_image() {
        let json = r#"{"render": {"default_width": 10000}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_zero_jobs() {
        let config: Config = serde_json::from_str(r#"{"catalog": {"jobs": 0}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_bad_pattern() {
        let config: Config =
            serde_json::from_str(r#"{"catalog": {"pattern": "[unclosed"}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let result: Result<Config, _> = serde_json::from_str(r#"{"palette": {"pink": [1, 2, 3]}}"#);
        assert!(result.is_err());
    }
}
