//! Pillar parameters, split by update path.
//!
//! [`HardParams`] are baked into the compiled program, so changing them
//! rebuilds the graphics session. [`SoftParams`] only touch uniforms or the
//! frame loop and are applied in place.

use crate::color::PillarColor;
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};

// ============================================================================
// Hard parameters
// ============================================================================

/// Parameters that force a full session rebuild when changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HardParams {
    /// Requested tier, resolved against the device profile.
    pub quality: QualityTier,
    /// Static tilt of the whole pillar, in degrees.
    pub pillar_rotation: f32,
}

impl Default for HardParams {
    fn default() -> Self {
        Self {
            quality: QualityTier::High,
            pillar_rotation: 0.0,
        }
    }
}

impl HardParams {
    /// Tilt angle in radians.
    pub fn pillar_rotation_radians(&self) -> f32 {
        self.pillar_rotation.to_radians()
    }

    /// Replace a non-finite tilt with 0 degrees, the angle the program bakes for it.
    pub fn sanitized(mut self) -> Self {
        if !self.pillar_rotation.is_finite() {
            self.pillar_rotation = 0.0;
        }
        self
    }
}

// ============================================================================
// Soft parameters
// ============================================================================

/// Parameters applied to a live session without rebuilding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoftParams {
    /// Gradient color at the top of the pillar.
    pub top_color: PillarColor,
    /// Gradient color at the bottom of the pillar.
    pub bottom_color: PillarColor,
    /// Final output multiplier.
    pub intensity: f32,
    /// Multiplier on simulation time advance per rendered frame.
    pub rotation_speed: f32,
    /// Scale of the tanh color compression.
    pub glow_amount: f32,
    /// Tube radius of the bounding field.
    pub pillar_width: f32,
    /// Vertical squash of the distorted field.
    pub pillar_height: f32,
    /// Strength of the per-pixel grain.
    pub noise_intensity: f32,
    /// Pointer-driven ray rotation.
    pub interactive: bool,
}

impl Default for SoftParams {
    fn default() -> Self {
        Self {
            top_color: default_top_color(),
            bottom_color: default_bottom_color(),
            intensity: 1.0,
            rotation_speed: 0.3,
            glow_amount: 0.005,
            pillar_width: 3.0,
            pillar_height: 0.4,
            noise_intensity: 0.5,
            interactive: false,
        }
    }
}

fn default_top_color() -> PillarColor {
    PillarColor::rgb(0x52, 0x27, 0xff)
}

fn default_bottom_color() -> PillarColor {
    PillarColor::rgb(0xff, 0x9f, 0xfc)
}

/// What a soft update needs from the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoftChange {
    /// At least one uniform-backed value changed.
    pub uniforms: bool,
    /// The interactivity flag flipped.
    pub interactive: bool,
    /// Only the frame loop reads this; no uniform write needed.
    pub rotation_speed: bool,
}

impl SoftChange {
    pub fn is_empty(&self) -> bool {
        !self.uniforms && !self.interactive && !self.rotation_speed
    }
}

impl SoftParams {
    /// Classify the difference between two parameter sets.
    pub fn diff(&self, next: &SoftParams) -> SoftChange {
        let uniforms = self.top_color != next.top_color
            || self.bottom_color != next.bottom_color
            || self.intensity != next.intensity
            || self.glow_amount != next.glow_amount
            || self.pillar_width != next.pillar_width
            || self.pillar_height != next.pillar_height
            || self.noise_intensity != next.noise_intensity
            || self.interactive != next.interactive;
        SoftChange {
            uniforms,
            interactive: self.interactive != next.interactive,
            rotation_speed: self.rotation_speed != next.rotation_speed,
        }
    }
}

// ============================================================================
// Composition
// ============================================================================

/// How the rendered surface composes with page content behind it.
///
/// Pass-through only: the renderer never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixBlendMode {
    Normal,
    Multiply,
    #[default]
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl MixBlendMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let soft = SoftParams::default();
        assert_eq!(soft.top_color.hex(), "#5227ff");
        assert_eq!(soft.bottom_color.hex(), "#ff9ffc");
        assert_eq!(soft.rotation_speed, 0.3);
        assert!(!soft.interactive);

        let hard = HardParams::default();
        assert_eq!(hard.quality, QualityTier::High);
        assert_eq!(hard.pillar_rotation, 0.0);
    }

    #[test]
    fn test_diff_rotation_speed_only() {
        let a = SoftParams::default();
        let b = SoftParams {
            rotation_speed: 2.0,
            ..a.clone()
        };
        let change = a.diff(&b);
        assert!(!change.uniforms);
        assert!(change.rotation_speed);
        assert!(!change.is_empty());
    }

    #[test]
    fn test_diff_interactive_touches_uniforms() {
        let a = SoftParams::default();
        let b = SoftParams {
            interactive: true,
            ..a.clone()
        };
        let change = a.diff(&b);
        assert!(change.uniforms);
        assert!(change.interactive);
        assert!(a.diff(&a).is_empty());
    }

    #[test]
    fn test_rotation_radians() {
        let hard = HardParams {
            pillar_rotation: 180.0,
            ..Default::default()
        };
        assert!((hard.pillar_rotation_radians() - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_sanitized_tilt_compares_equal() {
        let nan = HardParams {
            pillar_rotation: f32::NAN,
            ..Default::default()
        };
        assert_ne!(nan, nan);
        assert_eq!(nan.sanitized(), nan.sanitized());
        assert_eq!(nan.sanitized().pillar_rotation, 0.0);

        let tilted = HardParams {
            pillar_rotation: 12.5,
            ..Default::default()
        };
        assert_eq!(tilted.sanitized(), tilted);
    }
}
