//! Unit conversions and delimited multi-value decoding
//!
//! Every conversion is a single multiplication or division so that the
//! canonical values are exactly what the vendor figure scaled in IEEE double
//! precision would give.

use std::num::ParseFloatError;

use strum_macros::{Display, EnumIter};

/// Separator of multi-valued cells, one value per filter slot
pub const DELIMITER: char = ';';
/// Position of the aluminum thickness in a decoded filter thickness sequence
pub const ALUMINUM_SLOT: usize = 0;
/// Position of the copper thickness in a decoded filter thickness sequence
pub const COPPER_SLOT: usize = 1;

/// Vendor to canonical unit conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Conversion {
    /// mGy → Gy
    MilligrayToGray,
    /// µA → mA
    MicroampereToMilliampere,
    /// Gy·cm² → Gy·m²
    GrayCm2ToGrayM2,
    /// cm² → m²
    Cm2ToM2,
    /// mAs → µAs
    MilliampereSecondToMicroampereSecond,
}
impl Conversion {
    /// Converts a value from the vendor unit into the canonical unit
    pub fn apply(self, value: f64) -> f64 {
        use Conversion::*;
        match self {
            MilligrayToGray => value / 1000.,
            MicroampereToMilliampere => value / 1000.,
            GrayCm2ToGrayM2 => value / 10000.,
            Cm2ToM2 => value / (100. * 100.),
            MilliampereSecondToMicroampereSecond => value * 1000.,
        }
    }
    /// Converts a value from the canonical unit back into the vendor unit
    pub fn invert(self, value: f64) -> f64 {
        use Conversion::*;
        match self {
            MilligrayToGray => value * 1000.,
            MicroampereToMilliampere => value * 1000.,
            GrayCm2ToGrayM2 => value * 10000.,
            Cm2ToM2 => value * (100. * 100.),
            MilliampereSecondToMicroampereSecond => value / 1000.,
        }
    }
}

/// Splits a `v1;v2;...;vn` cell into its ordered values
pub fn split_delimited(value: &str) -> Vec<String> {
    value.split(DELIMITER).map(|v| v.to_string()).collect()
}
/// Parses a sequence of numeric strings, preserving the order
pub fn parse_floats<S: AsRef<str>>(values: &[S]) -> Result<Vec<f64>, ParseFloatError> {
    values.iter().map(|v| v.as_ref().trim().parse()).collect()
}
/// Splits and parses a `v1;v2;...;vn` cell
pub fn decode_floats(value: &str) -> Result<Vec<f64>, ParseFloatError> {
    parse_floats(&split_delimited(value))
}
/// Aluminum filter thickness of a `[aluminum, copper, ...]` sequence
pub fn aluminum_thickness(slots: &[f64]) -> Option<f64> {
    slots.get(ALUMINUM_SLOT).copied()
}
/// Copper filter thickness of a `[aluminum, copper, ...]` sequence
pub fn copper_thickness(slots: &[f64]) -> Option<f64> {
    slots.get(COPPER_SLOT).copied()
}
