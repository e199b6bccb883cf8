//! Package topology resolution.
//!
//! A package-type token such as `DIP-40`, `PLCC-84` or `Card Edge` names a
//! physical IC housing. [`resolve`] maps it to a [`PackageTopology`]: how the
//! pins are arranged around the body and what the body looks like.
//!
//! # Token Grammar
//!
//! `FAMILY["-"N]`, case-insensitive. The whole token is first matched as a
//! family (so `HC-49U` and `FC-PGA` stay intact); otherwise it is split at the
//! last `-` and the suffix must be a decimal pin count.
//!
//! | Family                              | Topology     | Body              |
//! |-------------------------------------|--------------|-------------------|
//! | `DIP`                               | dual-in-line | rectangle         |
//! | `QFP`, `TQFP`, `PLCC`               | quad         | rounded rectangle |
//! | `QFN`                               | quad         | square            |
//! | `SOIC`, `SOP`, `SSOP`               | quad         | narrow rectangle  |
//! | `BGA`, `PGA`, `FC-PGA`, `CSBGA`     | grid array   | square            |
//! | `Edge`, `Card Edge`, `Connector`    | connector    | rectangle         |
//! | `Module`                            | module       | rectangle         |
//! | `SIP`                               | single row   | rectangle         |
//! | `HC-49U`, `C0805`, `Electrolytic`   | single row, 2 pins | rounded / rectangle |

pub mod canvas;

use std::fmt;

use serde::Serialize;

use crate::chip::error::{RenderError, RenderResult};

/// Largest pin count a package token may declare.
pub const MAX_DECLARED_PINS: usize = 65_536;

/// How pins are arranged around a package body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Two rows, numbered down the left and back up the right.
    DualInLine,
    /// Four sides, numbered clockwise from the top-left.
    QuadSide,
    /// Balls or pins under the body on a 2D grid.
    GridArray,
    /// One row of leads.
    SingleRow,
    /// Edge connector contacts.
    Connector,
    /// Module header contacts.
    Module,
}

/// Outline style of the package body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyShape {
    /// Plain rectangle with slightly rounded corners.
    Rectangle,
    /// Rectangle narrowed across the pin rows (small-outline parts).
    NarrowRectangle,
    /// Rectangle with pronounced rounded corners.
    RoundedRectangle,
    /// Sharp-cornered square body.
    Square,
}

/// A recognised package family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageFamily {
    /// Dual in-line package.
    Dip,
    /// Quad flat package.
    Qfp,
    /// Thin quad flat package.
    Tqfp,
    /// Plastic leaded chip carrier.
    Plcc,
    /// Quad flat no-lead.
    Qfn,
    /// Small outline IC.
    Soic,
    /// Small outline package.
    Sop,
    /// Shrink small outline package.
    Ssop,
    /// Ball grid array.
    Bga,
    /// Pin grid array.
    Pga,
    /// Flip-chip pin grid array.
    FcPga,
    /// Chip-scale ball grid array.
    Csbga,
    /// Card edge connector.
    CardEdge,
    /// Generic connector.
    Connector,
    /// Plug-in module.
    Module,
    /// Single in-line package.
    Sip,
    /// HC-49/U crystal can.
    Hc49u,
    /// 0805 chip capacitor.
    C0805,
    /// Electrolytic capacitor.
    Electrolytic,
}

/// Family names as they appear in tokens (upper case).
const FAMILY_NAMES: [(&str, PackageFamily); 20] = [
    ("DIP", PackageFamily::Dip),
    ("QFP", PackageFamily::Qfp),
    ("TQFP", PackageFamily::Tqfp),
    ("PLCC", PackageFamily::Plcc),
    ("QFN", PackageFamily::Qfn),
    ("SOIC", PackageFamily::Soic),
    ("SOP", PackageFamily::Sop),
    ("SSOP", PackageFamily::Ssop),
    ("BGA", PackageFamily::Bga),
    ("PGA", PackageFamily::Pga),
    ("FC-PGA", PackageFamily::FcPga),
    ("CSBGA", PackageFamily::Csbga),
    ("EDGE", PackageFamily::CardEdge),
    ("CARD EDGE", PackageFamily::CardEdge),
    ("CONNECTOR", PackageFamily::Connector),
    ("MODULE", PackageFamily::Module),
    ("SIP", PackageFamily::Sip),
    ("HC-49U", PackageFamily::Hc49u),
    ("C0805", PackageFamily::C0805),
    ("ELECTROLYTIC", PackageFamily::Electrolytic),
];

impl PackageFamily {
    /// Looks up a family by its (upper-case, whitespace-normalised) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        FAMILY_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, family)| *family)
    }

    /// Returns the canonical token prefix for this family.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dip => "DIP",
            Self::Qfp => "QFP",
            Self::Tqfp => "TQFP",
            Self::Plcc => "PLCC",
            Self::Qfn => "QFN",
            Self::Soic => "SOIC",
            Self::Sop => "SOP",
            Self::Ssop => "SSOP",
            Self::Bga => "BGA",
            Self::Pga => "PGA",
            Self::FcPga => "FC-PGA",
            Self::Csbga => "CSBGA",
            Self::CardEdge => "Card Edge",
            Self::Connector => "Connector",
            Self::Module => "Module",
            Self::Sip => "SIP",
            Self::Hc49u => "HC-49U",
            Self::C0805 => "C0805",
            Self::Electrolytic => "Electrolytic",
        }
    }

    /// Returns the pin arrangement of this family.
    #[must_use]
    pub const fn kind(self) -> TopologyKind {
        match self {
            Self::Dip => TopologyKind::DualInLine,
            Self::Qfp
            | Self::Tqfp
            | Self::Plcc
            | Self::Qfn
            | Self::Soic
            | Self::Sop
            | Self::Ssop => TopologyKind::QuadSide,
            Self::Bga | Self::Pga | Self::FcPga | Self::Csbga => TopologyKind::GridArray,
            Self::CardEdge | Self::Connector => TopologyKind::Connector,
            Self::Module => TopologyKind::Module,
            Self::Sip | Self::Hc49u | Self::C0805 | Self::Electrolytic => TopologyKind::SingleRow,
        }
    }

    /// Returns the body outline of this family.
    #[must_use]
    pub const fn body_shape(self) -> BodyShape {
        match self {
            Self::Qfp | Self::Tqfp | Self::Plcc | Self::Hc49u => BodyShape::RoundedRectangle,
            Self::Soic | Self::Sop | Self::Ssop => BodyShape::NarrowRectangle,
            Self::Qfn | Self::Bga | Self::Pga | Self::FcPga | Self::Csbga => BodyShape::Square,
            Self::Dip
            | Self::CardEdge
            | Self::Connector
            | Self::Module
            | Self::Sip
            | Self::C0805
            | Self::Electrolytic => BodyShape::Rectangle,
        }
    }

    /// Returns the fixed number of terminals for two-terminal passives.
    #[must_use]
    pub const fn fixed_pin_count(self) -> Option<usize> {
        match self {
            Self::Hc49u | Self::C0805 | Self::Electrolytic => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arrangement and body style derived from a package-type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PackageTopology {
    /// Pin arrangement.
    pub kind: TopologyKind,

    /// Body outline.
    pub body_shape: BodyShape,

    /// Recognised family (`None` for synthetic fallback topologies).
    pub family: Option<PackageFamily>,

    /// Pin count declared by the token, or fixed by the family.
    pub pin_count: Option<usize>,
}

impl PackageTopology {
    /// Creates the topology of a family with an optional declared pin count.
    #[must_use]
    pub const fn of_family(family: PackageFamily, pin_count: Option<usize>) -> Self {
        Self {
            kind: family.kind(),
            body_shape: family.body_shape(),
            family: Some(family),
            pin_count,
        }
    }

    /// The synthetic single-column topology used by the fallback renderer.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            kind: TopologyKind::SingleRow,
            body_shape: BodyShape::Rectangle,
            family: None,
            pin_count: None,
        }
    }

    /// Returns the canonical package-type token (`DIP-40`, `Card Edge`).
    ///
    /// Empty for synthetic topologies.
    #[must_use]
    pub fn label(&self) -> String {
        match (self.family, self.pin_count) {
            (Some(family), Some(n)) if family.fixed_pin_count().is_none() => {
                format!("{family}-{n}")
            }
            (Some(family), _) => family.name().to_string(),
            (None, _) => String::new(),
        }
    }
}

/// Resolves a package-type token to its topology.
///
/// # Errors
///
/// - [`RenderError::UnknownPackageKind`] if the family is not recognised or
///   the suffix is not a decimal number.
/// - [`RenderError::InvalidPinCount`] if the declared count is zero, above
///   [`MAX_DECLARED_PINS`], or contradicts a fixed two-terminal family.
///
/// # Examples
///
/// ```
/// use retro_chip_renderer::chip::package::{resolve, BodyShape, TopologyKind};
///
/// let qfp = resolve("QFP-64").unwrap();
/// assert_eq!(qfp.kind, TopologyKind::QuadSide);
/// assert_eq!(qfp.body_shape, BodyShape::RoundedRectangle);
/// assert_eq!(qfp.pin_count, Some(64));
///
/// assert!(resolve("XYZ-99").is_err());
/// ```
pub fn resolve(token: &str) -> RenderResult<PackageTopology> {
    let normalised = token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    if let Some(family) = PackageFamily::from_name(&normalised) {
        return Ok(PackageTopology::of_family(family, family.fixed_pin_count()));
    }

    let Some((prefix, suffix)) = normalised.rsplit_once('-') else {
        return Err(RenderError::unknown_package(token));
    };
    let Some(family) = PackageFamily::from_name(prefix.trim()) else {
        return Err(RenderError::unknown_package(token));
    };
    let suffix = suffix.trim();
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RenderError::unknown_package(token));
    }

    let count = suffix.parse::<usize>().unwrap_or(usize::MAX);
    if count == 0 || count > MAX_DECLARED_PINS {
        return Err(RenderError::InvalidPinCount {
            count,
            limit: MAX_DECLARED_PINS,
        });
    }
    if let Some(fixed) = family.fixed_pin_count() {
        if count != fixed {
            return Err(RenderError::InvalidPinCount {
                count,
                limit: fixed,
            });
        }
    }

    Ok(PackageTopology::of_family(family, Some(count)))
}
