//! Quality tiers and their render settings.
//!
//! A caller asks for a [`QualityTier`]; [`resolve_quality`] downgrades it for
//! the device and [`lookup_settings`] turns the result into concrete numbers.

use crate::device::DeviceProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the pixel ratio used by the high tier.
pub const MAX_HIGH_PIXEL_RATIO: f32 = 2.0;

/// Requested quality preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityTier {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn all() -> &'static [QualityTier] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// A tier after device downgrade rules have been applied.
///
/// Only [`resolve_quality`] produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectiveQuality(QualityTier);

impl EffectiveQuality {
    pub fn tier(self) -> QualityTier {
        self.0
    }

    /// Adapter preference for this tier. The low tier asks for the low-power GPU.
    pub fn power_preference(self) -> wgpu::PowerPreference {
        match self.0 {
            QualityTier::Low => wgpu::PowerPreference::LowPower,
            QualityTier::Medium | QualityTier::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Numeric precision requested for the fragment program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Medium,
    High,
}

impl Precision {
    /// GLSL-style qualifier name, used in generated shader headers and logs.
    pub fn qualifier(&self) -> &'static str {
        match self {
            Self::Medium => "mediump",
            Self::High => "highp",
        }
    }
}

/// Concrete render parameters for one effective tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Raymarch step bound, baked into the compiled program.
    pub iterations: u32,
    /// Wave distortion octaves, baked into the compiled program.
    pub wave_iterations: u32,
    /// Render target resolution relative to the logical surface size.
    pub pixel_ratio: f32,
    pub precision: Precision,
    /// Multiplier applied to every march step, baked into the compiled program.
    pub step_multiplier: f32,
    pub target_fps: u32,
}

impl RenderSettings {
    /// Minimum time between two rendered frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }
}

/// Apply device downgrade rules to a requested tier.
///
/// First match wins: mobile always gets `Low`; a low-end machine asking for
/// `High` gets `Medium`; anything else is returned unchanged.
pub fn resolve_quality(requested: QualityTier, profile: &DeviceProfile) -> EffectiveQuality {
    if profile.is_mobile {
        return EffectiveQuality(QualityTier::Low);
    }
    if profile.is_low_end && requested == QualityTier::High {
        return EffectiveQuality(QualityTier::Medium);
    }
    EffectiveQuality(requested)
}

/// Fixed settings table. Only the high tier reads the profile (for its pixel ratio).
pub fn lookup_settings(quality: EffectiveQuality, profile: &DeviceProfile) -> RenderSettings {
    match quality.tier() {
        QualityTier::Low => RenderSettings {
            iterations: 24,
            wave_iterations: 1,
            pixel_ratio: 0.5,
            precision: Precision::Medium,
            step_multiplier: 1.5,
            target_fps: 30,
        },
        QualityTier::Medium => RenderSettings {
            iterations: 40,
            wave_iterations: 2,
            pixel_ratio: 0.65,
            precision: Precision::Medium,
            step_multiplier: 1.2,
            target_fps: 60,
        },
        QualityTier::High => RenderSettings {
            iterations: 80,
            wave_iterations: 4,
            pixel_ratio: profile.device_pixel_ratio.min(MAX_HIGH_PIXEL_RATIO),
            precision: Precision::High,
            step_multiplier: 1.0,
            target_fps: 60,
        },
    }
}
