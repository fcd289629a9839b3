//! Hex color parsing and sRGB linearization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// Parse hex color to RGB floats in sRGB space.
///
/// Accepts `rgb`, `rrggbb` and `rrggbbaa` with an optional leading `#`; alpha is ignored.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0.0; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as f32;
                rgb[i] = (v * 16.0 + v) / 255.0;
            }
            Some(rgb)
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some([r, g, b])
        }
        _ => None,
    }
}

/// sRGB electro-optical transfer function for one channel.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

/// A color entered as hex and stored as linear RGB.
///
/// Conversion happens once, when the value is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PillarColor {
    hex: String,
    linear: [f32; 3],
}

impl PillarColor {
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let srgb = parse_hex_color(hex).ok_or_else(|| ColorError::InvalidHex(hex.to_string()))?;
        Ok(Self {
            hex: normalize_hex(hex),
            linear: srgb.map(srgb_to_linear),
        })
    }

    /// Color from 8-bit sRGB channels.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            hex: format!("#{r:02x}{g:02x}{b:02x}"),
            linear: [r, g, b].map(|c| srgb_to_linear(c as f32 / 255.0)),
        }
    }

    /// Normalized `#rrggbb`-style source string.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn linear(&self) -> [f32; 3] {
        self.linear
    }
}

fn normalize_hex(hex: &str) -> String {
    format!("#{}", hex.trim().trim_start_matches('#').to_ascii_lowercase())
}

impl FromStr for PillarColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for PillarColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PillarColor> for String {
    fn from(color: PillarColor) -> Self {
        color.hex
    }
}

impl fmt::Display for PillarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#00ff88"), Some([0.0, 1.0, 136.0 / 255.0]));
        assert_eq!(parse_hex_color("ffffff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#fff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#00000000"), Some([0.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("invalid"), None);
        assert_eq!(parse_hex_color("#ggg"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_parse_hex_color_rejects_signs() {
        // from_str_radix alone would take "+f" as 0x0f.
        assert_eq!(parse_hex_color("#+f+f+f"), None);
        assert_eq!(parse_hex_color("#-1-1-1"), None);
        assert_eq!(parse_hex_color("#0f0f0f"), Some([15.0 / 255.0; 3]));
        assert!(PillarColor::from_hex("#+f+f+f").is_err());
    }

    #[test]
    fn test_srgb_to_linear_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-5);
        // Mid grey is darker in linear space.
        assert!((srgb_to_linear(0.5) - 0.214).abs() < 1e-3);
    }

    #[test]
    fn test_pillar_color_linearizes() {
        let color = PillarColor::from_hex("#5227FF").unwrap();
        assert_eq!(color.hex(), "#5227ff");
        let [r, g, b] = color.linear();
        assert!((r - srgb_to_linear(0x52 as f32 / 255.0)).abs() < 1e-6);
        assert!((g - srgb_to_linear(0x27 as f32 / 255.0)).abs() < 1e-6);
        assert!((b - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rgb_matches_hex() {
        assert_eq!(PillarColor::rgb(0xff, 0x9f, 0xfc), PillarColor::from_hex("#FF9FFC").unwrap());
    }

    #[test]
    fn test_pillar_color_rejects_garbage() {
        assert_eq!(
            "nope".parse::<PillarColor>(),
            Err(ColorError::InvalidHex("nope".to_string()))
        );
    }
}
