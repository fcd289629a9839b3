//! Seams between the controller and whatever renders the pillar.

use crate::gpu::{GpuError, PillarUniforms};
use crate::quality::{EffectiveQuality, RenderSettings};

/// Everything needed to build one graphics session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSpec {
    pub quality: EffectiveQuality,
    pub settings: RenderSettings,
    /// Static tilt in degrees, baked into the program.
    pub pillar_rotation: f32,
    /// Logical surface size.
    pub width: f32,
    pub height: f32,
}

impl SessionSpec {
    /// Physical render-target size for a logical size at this spec's pixel ratio.
    pub fn physical_size(&self, width: f32, height: f32) -> (u32, u32) {
        physical_size(width, height, self.settings.pixel_ratio)
    }
}

/// Logical size times pixel ratio, rounded, at least one pixel each way.
pub fn physical_size(width: f32, height: f32, pixel_ratio: f32) -> (u32, u32) {
    let scale = |v: f32| {
        let px = (v.max(0.0) * pixel_ratio).round();
        if px.is_finite() {
            (px as u32).max(1)
        } else {
            1
        }
    };
    (scale(width), scale(height))
}

/// A live set of graphics resources owned by one controller.
pub trait RenderSession {
    /// Upload the full uniform block.
    fn write_uniforms(&mut self, uniforms: &PillarUniforms);

    /// Issue one draw of the full-screen quad.
    fn draw(&mut self) -> Result<(), GpuError>;

    /// Resize the render target to a new logical size.
    fn resize(&mut self, width: f32, height: f32);

    /// Free every resource. Calling it again is a no-op.
    fn release(&mut self);
}

/// Builds sessions and answers the capability question for them.
pub trait SessionFactory {
    type Session: RenderSession;

    /// Memoized graphics-capability probe.
    fn is_supported(&self) -> bool;

    fn create_session(
        &mut self,
        spec: &SessionSpec,
        uniforms: &PillarUniforms,
    ) -> Result<Self::Session, GpuError>;
}
