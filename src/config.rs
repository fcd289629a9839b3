//! Component configuration surface.
//!
//! [`PillarConfig`] mirrors the props of the original background component and
//! deserializes from JSON using the same camelCase names.

use crate::color::{ColorError, PillarColor};
use crate::params::{HardParams, MixBlendMode, SoftParams};
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Color error: {0}")]
    Color(#[from] ColorError),
}

/// Full configuration of one pillar instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PillarConfig {
    #[serde(flatten)]
    pub hard: HardParams,
    #[serde(flatten)]
    pub soft: SoftParams,
    pub mix_blend_mode: MixBlendMode,
}

impl PillarConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The full-page festival background: faster spin, softer glow, 25 degree tilt.
    pub fn festival() -> Self {
        Self {
            hard: HardParams {
                quality: QualityTier::High,
                pillar_rotation: 25.0,
            },
            soft: SoftParams {
                top_color: PillarColor::rgb(0x52, 0x27, 0xff),
                bottom_color: PillarColor::rgb(0xff, 0x9f, 0xfc),
                intensity: 1.0,
                rotation_speed: 1.0,
                glow_amount: 0.002,
                pillar_width: 3.0,
                pillar_height: 0.4,
                noise_intensity: 0.5,
                interactive: false,
            },
            mix_blend_mode: MixBlendMode::Screen,
        }
    }

    /// Replace both gradient colors from hex strings.
    pub fn with_colors(mut self, top: &str, bottom: &str) -> Result<Self, ConfigError> {
        self.soft.top_color = PillarColor::from_hex(top)?;
        self.soft.bottom_color = PillarColor::from_hex(bottom)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = PillarConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PillarConfig::default());
    }

    #[test]
    fn test_camel_case_props() {
        let config = PillarConfig::from_json_str(
            r##"{
                "topColor": "#ffffff",
                "rotationSpeed": 1.5,
                "pillarRotation": 25,
                "quality": "medium",
                "mixBlendMode": "color-dodge",
                "interactive": true
            }"##,
        )
        .unwrap();
        assert_eq!(config.soft.top_color.hex(), "#ffffff");
        assert_eq!(config.soft.rotation_speed, 1.5);
        assert_eq!(config.hard.pillar_rotation, 25.0);
        assert_eq!(config.hard.quality, QualityTier::Medium);
        assert_eq!(config.mix_blend_mode, MixBlendMode::ColorDodge);
        assert!(config.soft.interactive);
        // untouched keys keep defaults
        assert_eq!(config.soft.pillar_width, 3.0);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let err = PillarConfig::from_json_str(r##"{"bottomColor": "#12"}"##).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_festival_preset() {
        let festival = PillarConfig::festival();
        let json = festival.to_json_pretty().unwrap();
        assert!(json.contains("\"glowAmount\": 0.002"));
        assert_eq!(PillarConfig::from_json_str(&json).unwrap(), festival);
    }

    #[test]
    fn test_with_colors() {
        let config = PillarConfig::default().with_colors("#000", "#fff").unwrap();
        assert_eq!(config.soft.top_color.hex(), "#000");
        assert!(PillarConfig::default().with_colors("#000", "zz").is_err());
    }
}
