//! Pin semantic classification and the draw colours attached to each class.
//!
//! Classification looks only at the pin name (case-insensitive) unless the
//! chip definition declares a type for the pin, in which case the declared
//! type wins. Rules are tried in priority order:
//!
//! | Class   | Name fragments                                   |
//! |---------|--------------------------------------------------|
//! | power   | `VCC`, `VDD`, `+5V`, `+12V`                      |
//! | ground  | `GND`, `VSS`, `0V`                               |
//! | clock   | `CLK`, `CLOCK`, `φ`                              |
//! | address | `A` followed by digits at the start              |
//! | data    | `D` followed by digits at the start              |
//! | control | `RD`, `WR`, `CS`, `CE`, `OE`, `WE`, `R/W`, `RESET`, `IRQ`, `NMI` |
//! | video   | `RED`, `GREEN`, `BLUE`, `SYNC`, `HSYNC`, `VSYNC`, `VIDEO` |
//! | audio   | `AUDIO`, `SOUND`                                 |
//!
//! Anything else is [`PinClass::Unused`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chip::descriptor::PinSpec;

/// Semantic pin category used for colour coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinClass {
    /// Supply rails.
    Power,
    /// Ground / 0 V.
    Ground,
    /// Clock inputs and outputs.
    Clock,
    /// Address bus lines.
    Address,
    /// Data bus lines.
    Data,
    /// Bus control and interrupt lines.
    Control,
    /// Video signals.
    Video,
    /// Audio signals.
    Audio,
    /// No recognised function.
    Unused,
}

impl PinClass {
    /// Every class, in classification priority order.
    pub const ALL: [Self; 9] = [
        Self::Power,
        Self::Ground,
        Self::Clock,
        Self::Address,
        Self::Data,
        Self::Control,
        Self::Video,
        Self::Audio,
        Self::Unused,
    ];

    /// Returns the lowercase class name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Ground => "ground",
            Self::Clock => "clock",
            Self::Address => "address",
            Self::Data => "data",
            Self::Control => "control",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unused => "unused",
        }
    }

    /// Parses a declared pin type.
    ///
    /// Accepts the class names plus the generic types found in older chip
    /// definitions (`io`, `generic`, `nc`), which map to [`PinClass::Unused`].
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "power" | "vcc" => Some(Self::Power),
            "ground" | "gnd" => Some(Self::Ground),
            "clock" | "clk" => Some(Self::Clock),
            "address" | "addr" => Some(Self::Address),
            "data" => Some(Self::Data),
            "control" | "ctrl" => Some(Self::Control),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "unused" | "io" | "generic" | "nc" => Some(Self::Unused),
            _ => None,
        }
    }
}

impl fmt::Display for PinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification rules in priority order.
const RULE_PATTERNS: [(PinClass, &str); 8] = [
    (PinClass::Power, r"(?i)VCC|VDD|\+5V|\+12V"),
    (PinClass::Ground, r"(?i)GND|VSS|0V"),
    (PinClass::Clock, r"(?i)CLK|CLOCK|φ"),
    (PinClass::Address, r"(?i)^A\d+"),
    (PinClass::Data, r"(?i)^D\d+"),
    (
        PinClass::Control,
        r"(?i)RD|WR|CS|CE|OE|WE|R/W|RESET|IRQ|NMI",
    ),
    (PinClass::Video, r"(?i)RED|GREEN|BLUE|HSYNC|VSYNC|SYNC|VIDEO"),
    (PinClass::Audio, r"(?i)AUDIO|SOUND"),
];

static RULES: LazyLock<Vec<(PinClass, Regex)>> =
    LazyLock::new(|| compile_rules(&RULE_PATTERNS));

fn compile_rules(patterns: &[(PinClass, &str)]) -> Vec<(PinClass, Regex)> {
    patterns
        .iter()
        .filter_map(|(class, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((*class, re)),
            Err(e) => {
                warn!(class = %class, pattern = *pattern, error = %e, "dropping pin classification rule");
                None
            }
        })
        .collect()
}

/// Classifies a pin, honouring its declared type when present.
#[must_use]
pub fn classify(pin: &PinSpec) -> PinClass {
    pin.hint.unwrap_or_else(|| classify_name(&pin.name))
}

/// Classifies a pin by name alone.
///
/// # Examples
///
/// ```
/// use retro_chip_renderer::chip::color::{classify_name, PinClass};
///
/// assert_eq!(classify_name("VCC2"), PinClass::Power);
/// assert_eq!(classify_name("A15"), PinClass::Address);
/// assert_eq!(classify_name("HSYNC"), PinClass::Video);
/// ```
#[must_use]
pub fn classify_name(name: &str) -> PinClass {
    let name = name.trim();
    RULES
        .iter()
        .find(|(_, re)| re.is_match(name))
        .map_or(PinClass::Unused, |(class, _)| *class)
}

/// An opaque RGB colour.
///
/// Serialised as a `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Creates a colour from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the colour as an SVG hex string (`#rrggbb`).
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Scales every channel by `factor`, saturating at 255.
    ///
    /// Factors below 1.0 darken, above 1.0 lighten.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scale = |c: u8| (f64::from(c) * factor).round().clamp(0.0, 255.0) as u8;
        Self::rgb(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Draw colour for each pin class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PinPalette {
    /// Power pins (red).
    pub power: Color,
    /// Ground pins (near black).
    pub ground: Color,
    /// Clock pins (green).
    pub clock: Color,
    /// Address pins (orange).
    pub address: Color,
    /// Data pins (blue).
    pub data: Color,
    /// Control pins (purple).
    pub control: Color,
    /// Video pins (yellow).
    pub video: Color,
    /// Audio pins (cyan).
    pub audio: Color,
    /// Unclassified pins (grey).
    pub unused: Color,
}

impl Default for PinPalette {
    fn default() -> Self {
        Self {
            power: Color::rgb(255, 100, 100),
            ground: Color::rgb(50, 50, 50),
            clock: Color::rgb(100, 255, 100),
            address: Color::rgb(255, 165, 0),
            data: Color::rgb(100, 150, 255),
            control: Color::rgb(200, 100, 255),
            video: Color::rgb(255, 255, 100),
            audio: Color::rgb(175, 238, 238),
            unused: Color::rgb(180, 180, 180),
        }
    }
}

impl PinPalette {
    /// Returns the draw colour for a pin class.
    #[must_use]
    pub const fn color_for(&self, class: PinClass) -> Color {
        match class {
            PinClass::Power => self.power,
            PinClass::Ground => self.ground,
            PinClass::Clock => self.clock,
            PinClass::Address => self.address,
            PinClass::Data => self.data,
            PinClass::Control => self.control,
            PinClass::Video => self.video,
            PinClass::Audio => self.audio,
            PinClass::Unused => self.unused,
        }
    }
}
