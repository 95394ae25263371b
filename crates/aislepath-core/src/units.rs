//! Length units for reporting distances.

use std::fmt;

const FEET_PER_METER: f64 = 3.28084;

/// A unit of length a layout can be calibrated or displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
}

impl LengthUnit {
    /// Convert `value` expressed in `self` into `to`.
    pub fn convert(self, value: f64, to: LengthUnit) -> f64 {
        match (self, to) {
            (Self::Meters, Self::Feet) => value * FEET_PER_METER,
            (Self::Feet, Self::Meters) => value / FEET_PER_METER,
            _ => value,
        }
    }

    /// Short suffix for display.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Feet => "ft",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meters => f.write_str("meters"),
            Self::Feet => f.write_str("feet"),
        }
    }
}
