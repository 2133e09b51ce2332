//! Scene palette colors.
//!
//! Colors are configured as `#rrggbb` strings and uploaded to shaders in
//! linear space.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
    #[error("expected a #rrggbb color, got {0:?}")]
    Format(String),
}

/// An sRGB color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Parse a `#rrggbb` hex string.
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorError::Format(s.to_string()))?;

        let byte = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).expect("validated hex digits")
        };
        Ok(Self {
            r: byte(0) as f32 / 255.0,
            g: byte(2) as f32 / 255.0,
            b: byte(4) as f32 / 255.0,
        })
    }

    /// sRGB components as an array.
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Linear-space components for shader upload.
    pub fn to_linear(self) -> [f32; 3] {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
        )
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scene_palette() {
        let pink = Rgb::from_hex("#fbbcc5").unwrap();
        assert!((pink.r - 251.0 / 255.0).abs() < 1e-6);
        assert!((pink.g - 188.0 / 255.0).abs() < 1e-6);
        assert!((pink.b - 197.0 / 255.0).abs() < 1e-6);

        let night = Rgb::from_hex("#0a0b24").unwrap();
        assert!((night.b - 36.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["fbbcc5", "#fbb", "#fbbcc", "#fbbcc5a", "#gggggg", ""] {
            assert!(Rgb::from_hex(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn display_round_trips() {
        let c = Rgb::from_hex("#ffffe5").unwrap();
        assert_eq!(c.to_string(), "#ffffe5");
    }

    #[test]
    fn linear_conversion_endpoints() {
        let black = Rgb::from_hex("#000000").unwrap().to_linear();
        assert_eq!(black, [0.0, 0.0, 0.0]);
        let white = Rgb::from_hex("#ffffff").unwrap().to_linear();
        for c in white {
            assert!((c - 1.0).abs() < 1e-6);
        }
        // Linear values sit below sRGB values for mid tones.
        let mid = Rgb::from_hex("#808080").unwrap();
        assert!(mid.to_linear()[0] < mid.r);
    }
}
