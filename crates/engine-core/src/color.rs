use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Straight-alpha sRGB color as a canvas-like surface consumes it.
///
/// Channels are `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[inline]
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` / `#rgb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let rgb = Srgb::<u8>::from_str(hex.trim())
            .map_err(|_| CoreError::InvalidColor(hex.to_string()))?;
        Ok(Self::rgba(rgb.red, rgb.green, rgb.blue, 255))
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a.clamp(0.0, 1.0);
        self
    }

    /// Quantize to sRGB u8 RGBA.
    #[inline]
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// CSS `rgba(...)` literal.
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("rgba({},{},{},{})", r, g, b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert_eq!(c.to_rgba8(), [255, 128, 0, 255]);
        assert!(Color::from_hex("nope").is_err());
    }

    #[test]
    fn test_css_literal() {
        assert_eq!(Color::rgba(10, 20, 30, 255).with_alpha(0.5).to_css(), "rgba(10,20,30,0.5)");
    }
}
