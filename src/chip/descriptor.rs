//! Chip definitions as consumed by the engine.
//!
//! A [`ComponentDescriptor`] is read-only input: the engine never mutates it.
//! On disk it is a flat JSON object:
//!
//! ```json
//! {
//!   "id": "spectrum_ula",
//!   "name": "ULA Ferranti",
//!   "category": "Custom",
//!   "package_type": "DIP-40",
//!   "year": 1982,
//!   "manufacturer": "Ferranti",
//!   "pins": ["A0", "A1", {"name": "VCC", "type": "power"}]
//! }
//! ```
//!
//! Pins may be bare names or objects with `name` plus optional `number`,
//! `type`, `x` and `y`. The optional `year`, `manufacturer` and `speed` fields
//! are gathered into an [`Era`]; absence of all three is `None`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::chip::color::PinClass;
use crate::chip::geometry::Point;
use crate::error::DescriptorError;

/// Functional category of a chip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// CPUs.
    Processor,
    /// Video chips.
    Video,
    /// Sound chips.
    Audio,
    /// I/O controllers.
    Io,
    /// RAM/ROM.
    Memory,
    /// Custom logic (ULAs, gate arrays).
    #[default]
    Custom,
    /// Any category not listed above, kept verbatim.
    Other(String),
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "processor" | "processors" | "cpu" => Self::Processor,
            "video" => Self::Video,
            "audio" | "sound" => Self::Audio,
            "i/o" | "io" => Self::Io,
            "memory" => Self::Memory,
            "custom" | "custom chips" => Self::Custom,
            _ => Self::Other(s),
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processor => f.write_str("Processor"),
            Self::Video => f.write_str("Video"),
            Self::Audio => f.write_str("Audio"),
            Self::Io => f.write_str("I/O"),
            Self::Memory => f.write_str("Memory"),
            Self::Custom => f.write_str("Custom"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A declared pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinSpec {
    /// 1-based declared pin number.
    pub number: u32,

    /// Pin name (not guaranteed unique).
    pub name: String,

    /// Declared semantic type, overriding name-based classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<PinClass>,

    /// Position stored by a legacy chip definition, if any.
    ///
    /// Only the alignment checker looks at this; layout ignores it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

impl PinSpec {
    /// Creates a pin with no hint and no stored position.
    #[must_use]
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            hint: None,
            position: None,
        }
    }

    /// Sets the declared semantic type.
    #[must_use]
    pub const fn with_hint(mut self, hint: PinClass) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Sets a stored position.
    #[must_use]
    pub const fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }
}

/// A manufacturing year as written in a chip definition.
///
/// Definitions use both `"year": 1985` and `"year": "1985"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    /// Numeric year.
    Number(i64),
    /// Textual year, possibly unparseable.
    Text(String),
}

impl YearValue {
    /// Returns the year if it can be read as a number.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Number(n) => i32::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Optional historical metadata of a chip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Era {
    /// Manufacturing year.
    pub year: Option<YearValue>,
    /// Clock speed label (e.g. "8MHz").
    pub speed: Option<String>,
    /// Manufacturer name.
    pub manufacturer: Option<String>,
}

impl Era {
    /// Returns the numeric year, if present and parseable.
    #[must_use]
    pub fn year_number(&self) -> Option<i32> {
        self.year.as_ref().and_then(YearValue::year)
    }
}

/// An alternative package a chip ships in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVariant {
    /// Variant identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Package-type token.
    pub package_type: String,
}

/// An abstract chip definition: name, category, ordered pins, optional era.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor", into = "RawDescriptor")]
pub struct ComponentDescriptor {
    /// Stable identifier, used as the cache key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Functional category.
    pub category: Category,
    /// Free-text description.
    pub description: Option<String>,
    /// Pins in package numbering order.
    pub pins: Vec<PinSpec>,
    /// Historical metadata.
    pub era: Option<Era>,
    /// Default package-type token.
    pub package_type: Option<String>,
    /// Component-specific image width in pixels.
    pub width: Option<u32>,
    /// Component-specific image height in pixels.
    pub height: Option<u32>,
    /// Alternative packages.
    pub variants: Vec<PackageVariant>,
}

impl ComponentDescriptor {
    /// Creates a descriptor with no pins and no metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            name,
            category,
            description: None,
            pins: Vec::new(),
            era: None,
            package_type: None,
            width: None,
            height: None,
            variants: Vec::new(),
        }
    }

    /// Replaces the pins with the given names, numbered from 1.
    #[must_use]
    pub fn with_pin_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pins = names
            .into_iter()
            .zip(1u32..)
            .map(|(name, number)| PinSpec::new(number, name))
            .collect();
        self
    }

    /// Sets the era metadata.
    #[must_use]
    pub fn with_era(mut self, era: Era) -> Self {
        self.era = Some(era);
        self
    }

    /// Sets the default package-type token.
    #[must_use]
    pub fn with_package(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = Some(package_type.into());
        self
    }

    /// Parses a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the name is empty.
    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        serde_json::from_str(json).map_err(|e| DescriptorError::Parse {
            path: None,
            source: e,
        })
    }

    /// Loads a descriptor from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DescriptorError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| DescriptorError::Parse {
            path: Some(path.to_path_buf()),
            source: e,
        })
    }

    /// Returns a stable hash of everything that affects how the chip is drawn.
    ///
    /// Two descriptors sharing an `id` but differing in name, category, pins
    /// or era get different fingerprints, so the render cache keys on both.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fingerprint::new();
        h.write_str(&self.name);
        h.write_str(&self.category.to_string());
        h.write_len(self.pins.len());
        for pin in &self.pins {
            h.write_u64(u64::from(pin.number));
            h.write_str(&pin.name);
            h.write_opt_str(pin.hint.map(PinClass::as_str));
            match pin.position {
                Some(p) => {
                    h.write_u8(1);
                    h.write_u64(p.x.to_bits());
                    h.write_u64(p.y.to_bits());
                }
                None => h.write_u8(0),
            }
        }
        match &self.era {
            Some(era) => {
                h.write_u8(1);
                match &era.year {
                    Some(YearValue::Number(n)) => {
                        h.write_u8(1);
                        h.write_u64(u64::from_le_bytes(n.to_le_bytes()));
                    }
                    Some(YearValue::Text(t)) => {
                        h.write_u8(2);
                        h.write_str(t);
                    }
                    None => h.write_u8(0),
                }
                h.write_opt_str(era.speed.as_deref());
                h.write_opt_str(era.manufacturer.as_deref());
            }
            None => h.write_u8(0),
        }
        h.finish()
    }

    /// Serialises the descriptor back to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json_pretty(&self) -> Result<String, DescriptorError> {
        serde_json::to_string_pretty(self).map_err(|e| DescriptorError::Parse {
            path: None,
            source: e,
        })
    }
}

/// Derives an identifier from a display name ("ULA Ferranti" → "ula_ferranti").
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

const FINGERPRINT_SEED: u64 = 0x5a80_c0de_6502_1976;

/// Length-prefixed xxh3 hashing, stable across runs and platforms.
struct Fingerprint {
    inner: Xxh3,
}

impl Fingerprint {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(FINGERPRINT_SEED),
        }
    }

    fn write_u8(&mut self, v: u8) {
        self.inner.update(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.inner.update(&v.to_le_bytes());
    }

    fn write_len(&mut self, len: usize) {
        self.write_u64(u64::try_from(len).unwrap_or(u64::MAX));
    }

    fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.inner.update(s.as_bytes());
    }

    fn write_opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.write_u8(1);
                self.write_str(s);
            }
            None => self.write_u8(0),
        }
    }

    fn finish(&self) -> u64 {
        self.inner.digest()
    }
}

// =============================================================================
// On-disk representation
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPin {
    Name(String),
    Full {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number: Option<u32>,
        name: String,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    pins: Vec<RawPin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    package_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<YearValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    variants: Vec<PackageVariant>,
}

impl TryFrom<RawDescriptor> for ComponentDescriptor {
    type Error = String;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err("component name cannot be empty".to_string());
        }

        let pins = raw
            .pins
            .into_iter()
            .zip(1u32..)
            .map(|(pin, index)| match pin {
                RawPin::Name(name) => PinSpec::new(index, name),
                RawPin::Full {
                    number,
                    name,
                    kind,
                    x,
                    y,
                } => PinSpec {
                    number: number.unwrap_or(index),
                    name,
                    hint: kind.as_deref().and_then(PinClass::from_str_loose),
                    position: x.zip(y).map(|(x, y)| Point::new(x, y)),
                },
            })
            .collect();

        let era = if raw.year.is_none() && raw.speed.is_none() && raw.manufacturer.is_none() {
            None
        } else {
            Some(Era {
                year: raw.year,
                speed: raw.speed,
                manufacturer: raw.manufacturer,
            })
        };

        Ok(Self {
            id: raw
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| slugify(&name)),
            name,
            category: raw.category,
            description: raw.description,
            pins,
            era,
            package_type: raw.package_type,
            width: raw.width,
            height: raw.height,
            variants: raw.variants,
        })
    }
}

impl From<ComponentDescriptor> for RawDescriptor {
    fn from(d: ComponentDescriptor) -> Self {
        let era = d.era.unwrap_or_default();
        Self {
            id: Some(d.id),
            name: d.name,
            category: d.category,
            description: d.description,
            pins: d
                .pins
                .into_iter()
                .map(|pin| RawPin::Full {
                    number: Some(pin.number),
                    name: pin.name,
                    kind: pin.hint.map(|h| h.as_str().to_string()),
                    x: pin.position.map(|p| p.x),
                    y: pin.position.map(|p| p.y),
                })
                .collect(),
            package_type: d.package_type,
            year: era.year,
            manufacturer: era.manufacturer,
            speed: era.speed,
            width: d.width,
            height: d.height,
            variants: d.variants,
        }
    }
}
