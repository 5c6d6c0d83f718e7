//! Physical pixel calibration.

use crate::core::CellError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Edge length of one pixel in micrometres.
///
/// Always positive and finite. Areas scale with the square of this value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PixelSize(f64);

impl PixelSize {
    /// Creates a calibration of `microns` µm per pixel edge.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InvalidInput`] unless `microns` is positive and finite.
    pub fn new(microns: f64) -> Result<Self, CellError> {
        if !microns.is_finite() || microns <= 0.0 {
            return Err(CellError::invalid_input(format!(
                "pixel size must be a positive number of µm/pixel, got {}",
                microns
            )));
        }
        Ok(Self(microns))
    }

    /// µm per pixel edge.
    pub fn microns(self) -> f64 {
        self.0
    }

    /// µm² covered by one pixel.
    pub fn pixel_area(self) -> f64 {
        self.0 * self.0
    }

    /// Parses free text typed by a user, ignoring anything unusable.
    ///
    /// Blank, malformed, zero and negative input all mean "no calibration".
    pub fn parse_lenient(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl TryFrom<f64> for PixelSize {
    type Error = CellError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PixelSize> for f64 {
    fn from(value: PixelSize) -> Self {
        value.0
    }
}

impl FromStr for PixelSize {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| CellError::invalid_input(format!("'{}' is not a number", s.trim())))?;
        Self::new(value)
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} µm/pixel", self.0)
    }
}
