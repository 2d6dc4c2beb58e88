//! RGBA colors with hex-string (de)serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::HeatmapError;

/// Color value in RGBA format.
///
/// Serialized as a CSS hex string: `#rrggbb` when opaque, `#rrggbbaa`
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Build a color from a fractional alpha in `[0, 1]`.
    ///
    /// The alpha byte is `floor(alpha * 255)`; out-of-range and NaN alphas
    /// are clamped (NaN becomes fully transparent).
    pub fn rgba_f(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self { r, g, b, a: alpha_byte(alpha) }
    }

    /// Same color with the alpha byte replaced.
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { a: alpha_byte(alpha), ..self }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, HeatmapError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || HeatmapError::InvalidColor(hex.to_string());

        if !digits.is_ascii() {
            return Err(invalid());
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match digits.len() {
            3 => {
                let nibble = |i: usize| byte(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
            )),
            8 => Ok(Self::new(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
                byte(&digits[6..8])?,
            )),
            _ => Err(invalid()),
        }
    }

    /// Hex representation, alpha omitted when opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Linear interpolation between two colors.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };

        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

fn alpha_byte(alpha: f64) -> u8 {
    if alpha.is_nan() {
        return 0;
    }
    (alpha.clamp(0.0, 1.0) * 255.0).floor() as u8
}

impl FromStr for Color {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = HeatmapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
