//! Styling strategies for the composer.
//!
//! [`EraStyle`] picks body and text colours from the manufacturing year.
//! [`BodyStyle`] picks the outline geometry from the package body shape.

use crate::chip::color::Color;
use crate::chip::descriptor::Era;
use crate::chip::package::BodyShape;

/// Chips made before this year get the ceramic look.
pub const CERAMIC_BEFORE_YEAR: i32 = 1980;

/// Body and text colours for one manufacturing era.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraStyle {
    /// Package body fill.
    pub body: Color,
    /// Package body outline.
    pub outline: Color,
    /// Silkscreen text.
    pub text: Color,
    /// Pin-1 notch fill.
    pub notch: Color,
}

impl EraStyle {
    /// Brown ceramic package with cream text.
    pub const CERAMIC: Self = Self {
        body: Color::rgb(139, 118, 76),
        outline: Color::rgb(167, 142, 91),
        text: Color::rgb(255, 248, 220),
        notch: Color::rgb(93, 79, 51),
    };

    /// Black plastic package with white text.
    pub const PLASTIC: Self = Self {
        body: Color::rgb(45, 45, 45),
        outline: Color::rgb(54, 54, 54),
        text: Color::rgb(255, 255, 255),
        notch: Color::rgb(30, 30, 30),
    };

    /// Chooses the style for an era.
    ///
    /// A missing era, a missing year and an unparseable year all get the
    /// plastic style.
    #[must_use]
    pub fn for_era(era: Option<&Era>) -> Self {
        match era.and_then(Era::year_number) {
            Some(year) if year < CERAMIC_BEFORE_YEAR => Self::CERAMIC,
            _ => Self::PLASTIC,
        }
    }
}

/// Outline geometry for one body shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyStyle {
    /// Corner radius.
    pub corner_radius: f64,
    /// Fraction of the width removed from each side.
    pub narrowing: f64,
}

impl BodyStyle {
    /// Chooses the style for a body shape.
    #[must_use]
    pub const fn for_shape(shape: BodyShape) -> Self {
        match shape {
            BodyShape::RoundedRectangle => Self {
                corner_radius: 8.0,
                narrowing: 0.0,
            },
            BodyShape::Rectangle => Self {
                corner_radius: 3.0,
                narrowing: 0.0,
            },
            BodyShape::Square => Self {
                corner_radius: 0.0,
                narrowing: 0.0,
            },
            BodyShape::NarrowRectangle => Self {
                corner_radius: 2.0,
                narrowing: 0.08,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::descriptor::YearValue;

    fn era(year: YearValue) -> Era {
        Era {
            year: Some(year),
            ..Era::default()
        }
    }

    #[test]
    fn ceramic_before_1980() {
        assert_eq!(EraStyle::for_era(Some(&era(YearValue::Number(1975)))), EraStyle::CERAMIC);
        assert_eq!(
            EraStyle::for_era(Some(&era(YearValue::Text("1979".to_string())))),
            EraStyle::CERAMIC
        );
    }

    #[test]
    fn plastic_otherwise() {
        assert_eq!(EraStyle::for_era(Some(&era(YearValue::Number(1980)))), EraStyle::PLASTIC);
        assert_eq!(EraStyle::for_era(None), EraStyle::PLASTIC);
        assert_eq!(EraStyle::for_era(Some(&Era::default())), EraStyle::PLASTIC);
        assert_eq!(
            EraStyle::for_era(Some(&era(YearValue::Text("mid 70s".to_string())))),
            EraStyle::PLASTIC
        );
    }

    #[test]
    fn outline_is_lighter_than_body() {
        for style in [EraStyle::CERAMIC, EraStyle::PLASTIC] {
            assert_eq!(style.outline, style.body.scaled(1.2));
            assert_eq!(style.notch, style.body.scaled(1.0 / 1.5));
        }
    }

    #[test]
    fn narrow_body_only_for_narrow_shape() {
        assert!(BodyStyle::for_shape(BodyShape::NarrowRectangle).narrowing > 0.0);
        assert!(BodyStyle::for_shape(BodyShape::Square).corner_radius.abs() < f64::EPSILON);
        assert!(
            BodyStyle::for_shape(BodyShape::RoundedRectangle).corner_radius
                > BodyStyle::for_shape(BodyShape::Rectangle).corner_radius
        );
    }
}
