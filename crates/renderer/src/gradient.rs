//! Color mapping for NDVI samples and measurement indices.
//!
//! NDVI values are mapped onto a two-stop ramp (red for bare soil, green for
//! dense vegetation). Negative samples mark "no data" and render fully
//! transparent. Measurements without a value of their own are told apart by
//! [`index_color`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    /// CSS `green`, deliberately darker than the NDVI ramp's high end.
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const LIME: Color = Color::rgb(0, 255, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// `#rrggbbaa`, lowercase.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// `rgb(r,g,b)`, alpha dropped.
    pub fn to_css_rgb(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, RenderError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || RenderError::UnsupportedFormat(format!("invalid color '{}'", hex));
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let nibble = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 1], 16)
                        .map(|n| n * 17)
                        .map_err(|_| invalid())
                };
                Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Linear color interpolation, `t` clamped to `[0, 1]`, channels rounded.
pub fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let channel = |a: u8, b: u8| -> u8 {
        let value = a as f64 + (b as f64 - a as f64) * t;
        value.round().clamp(0.0, 255.0) as u8
    };

    Color::new(
        channel(color1.r, color2.r),
        channel(color1.g, color2.g),
        channel(color1.b, color2.b),
        channel(color1.a, color2.a),
    )
}

/// A two-stop color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    pub low_color: Color,
    pub high_color: Color,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            low_color: Color::RED,
            high_color: Color::LIME,
        }
    }
}

impl ColorRamp {
    pub fn new(low_color: Color, high_color: Color) -> Self {
        Self {
            low_color,
            high_color,
        }
    }

    /// Map `value` within `[low, high]` onto the ramp.
    ///
    /// Negative and non-finite values are "no data" and come back fully
    /// transparent whatever the range. When `low == high` every value at or
    /// above the range maps to the high color and everything below to the low
    /// color.
    pub fn color_of(&self, value: f64, low: f64, high: f64) -> Color {
        if !value.is_finite() || value < 0.0 {
            return Color::transparent();
        }
        let span = high - low;
        let t = if span.abs() < f64::EPSILON || !span.is_finite() {
            if value >= high {
                1.0
            } else {
                0.0
            }
        } else {
            (value - low) / span
        };
        interpolate_color(self.low_color, self.high_color, t)
    }
}

/// [`ColorRamp::color_of`] on the default red-to-green ramp.
pub fn color_of(value: f64, low: f64, high: f64) -> Color {
    ColorRamp::default().color_of(value, low, high)
}

/// Multiplier spreading consecutive indices across the 24-bit color space.
const INDEX_COLOR_MULTIPLIER: u64 = 22_041_998;

/// Named colors for the first indices.
const INDEX_PRESETS: [Color; 3] = [Color::RED, Color::YELLOW, Color::GREEN];

/// Deterministic color for an arbitrary index (measurement ordinal, season slot, ...).
///
/// The first indices get named colors. Past those, the index is multiplied
/// by a fixed constant and the low 24 bits become `0xRRGGBB`. Nearby indices
/// are not guaranteed to look different.
pub fn index_color(index: u64) -> Color {
    if let Some(preset) = INDEX_PRESETS.get(index as usize) {
        return *preset;
    }
    let hashed = index.wrapping_mul(INDEX_COLOR_MULTIPLIER) & 0x00FF_FFFF;
    Color::rgb(
        ((hashed >> 16) & 0xFF) as u8,
        ((hashed >> 8) & 0xFF) as u8,
        (hashed & 0xFF) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_of_endpoints() {
        assert_eq!(color_of(0.0, 0.0, 1.0), Color::rgb(255, 0, 0));
        assert_eq!(color_of(1.0, 0.0, 1.0), Color::rgb(0, 255, 0));
        assert_eq!(color_of(0.5, 0.0, 1.0), Color::rgb(128, 128, 0));
    }

    #[test]
    fn test_negative_is_transparent() {
        assert!(color_of(-0.01, 0.0, 1.0).is_transparent());
        assert!(color_of(-5.0, -10.0, 10.0).is_transparent());
        assert!(color_of(f64::NAN, 0.0, 1.0).is_transparent());
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(color_of(0.4, 0.4, 0.4), Color::LIME);
        assert_eq!(color_of(0.3, 0.4, 0.4), Color::RED);
    }

    #[test]
    fn test_hex_round_trip() {
        let color = Color::new(18, 52, 86, 120);
        assert_eq!(color.to_hex(), "#12345678");
        assert_eq!(Color::from_hex("#12345678").unwrap(), color);
        assert_eq!(Color::from_hex("fff").unwrap(), Color::rgb(255, 255, 255));
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_index_color() {
        assert_eq!(index_color(0), Color::RED);
        assert_eq!(index_color(1), Color::YELLOW);
        assert_eq!(index_color(2), Color::GREEN);
        // 3 * 22041998 = 0x3F100AA
        assert_eq!(index_color(3), Color::rgb(0xF1, 0x00, 0xAA));
        assert_eq!(index_color(17), index_color(17));
    }
}
