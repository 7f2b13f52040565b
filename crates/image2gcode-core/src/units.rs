//! Coordinate precision utilities
//!
//! Every coordinate written to G-Code is quantized to a fixed number of decimals
//! and carried around as an integer tick count (1 tick = 10^-digits mm). Comparing
//! ticks instead of floats keeps coordinate de-duplication exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimals used for X/Y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Precision(u8);

impl Precision {
    /// Fewest decimals ever written.
    pub const MIN_DIGITS: u8 = 1;
    /// Most decimals ever written.
    pub const MAX_DIGITS: u8 = 6;

    /// Create a precision, clamped to `MIN_DIGITS..=MAX_DIGITS`.
    pub fn new(digits: u8) -> Self {
        Self(digits.clamp(Self::MIN_DIGITS, Self::MAX_DIGITS))
    }

    /// Precision matching the decimals of a step size as it is usually written
    /// (`0.1` gives 1 digit, `0.05` gives 2).
    pub fn from_step(step: f64) -> Self {
        let repr = format!("{}", step);
        let digits = repr
            .split_once('.')
            .map(|(_, fraction)| fraction.len())
            .unwrap_or(0);
        Self::new(digits.min(u8::MAX as usize) as u8)
    }

    /// Number of decimals.
    pub fn digits(self) -> u8 {
        self.0
    }

    /// Ticks per millimeter.
    pub fn scale(self) -> f64 {
        10f64.powi(self.0 as i32)
    }

    /// Quantize a millimeter value to ticks (half away from zero).
    pub fn quantize(self, mm: f64) -> i64 {
        (mm * self.scale()).round() as i64
    }

    /// Convert ticks back to millimeters.
    pub fn to_mm(self, ticks: i64) -> f64 {
        ticks as f64 / self.scale()
    }

    /// Format ticks as a fixed-point decimal string without float rounding.
    pub fn format(self, ticks: i64) -> String {
        let digits = self.0 as usize;
        let scale = 10u64.pow(self.0 as u32);
        let sign = if ticks < 0 { "-" } else { "" };
        let abs = ticks.unsigned_abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / scale,
            abs % scale,
            width = digits
        )
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(Self::MIN_DIGITS)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
