//! Light Pillar
//!
//! Raymarched volumetric light-pillar background renderer.
//!
//! # Features
//!
//! - Device profiling (mobile / low-end) and quality-tier resolution
//! - WGSL program generation with compile-time loop bounds, validated by naga
//! - Headless GPU rendering via wgpu, with PNG capture
//! - CPU reference renderer for the same distance field
//! - Lifecycle controller: FPS throttle, visibility pause, debounced resize,
//!   throttled pointer input and idempotent teardown
//! - JSON configuration via serde

pub mod color;
pub mod config;
pub mod device;
pub mod field;
pub mod gpu;
pub mod lifecycle;
pub mod params;
pub mod quality;

// Re-export commonly used types
pub use color::{parse_hex_color, ColorError, PillarColor};
pub use config::{ConfigError, PillarConfig};
pub use device::DeviceProfile;
pub use gpu::{
    is_graphics_supported, CapabilityProbe, GpuContext, GpuError, GpuSession, GpuSessionFactory,
    PillarUniforms, ProgramSource, ProgramVariant,
};
pub use lifecycle::{
    FallbackReason, FrameOutcome, HeadlessHost, Host, LightPillar, PillarState, PillarView,
    PointerEvent, RenderSession, SessionFactory,
};
pub use params::{HardParams, MixBlendMode, SoftParams};
pub use quality::{
    lookup_settings, resolve_quality, EffectiveQuality, Precision, QualityTier, RenderSettings,
};
