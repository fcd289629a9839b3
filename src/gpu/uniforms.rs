//! Uniform block shared by the CPU field and the fragment program.

use crate::params::SoftParams;

/// Uniform data passed to the pillar shader.
///
/// Field order follows WGSL uniform layout rules: each `vec3` starts on a
/// 16-byte boundary and is followed by a scalar that fills its last lane.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PillarUniforms {
    /// Logical surface size.
    pub resolution: [f32; 2],
    /// Pointer position in [-1, 1], y up. Zero means no pointer.
    pub mouse: [f32; 2],
    pub top_color: [f32; 3],
    pub intensity: f32,
    pub bottom_color: [f32; 3],
    pub glow_amount: f32,
    pub time: f32,
    pub pillar_width: f32,
    pub pillar_height: f32,
    pub noise_intensity: f32,
    pub rot_cos: f32,
    pub rot_sin: f32,
    pub interactive: u32,
    pub _padding: f32,
}

impl PillarUniforms {
    /// Initial uniforms for a new session.
    pub fn new(soft: &SoftParams, width: f32, height: f32) -> Self {
        let mut uniforms = Self {
            resolution: [width, height],
            mouse: [0.0, 0.0],
            top_color: [0.0; 3],
            intensity: 0.0,
            bottom_color: [0.0; 3],
            glow_amount: 0.0,
            time: 0.0,
            pillar_width: 0.0,
            pillar_height: 0.0,
            noise_intensity: 0.0,
            rot_cos: 1.0,
            rot_sin: 0.0,
            interactive: 0,
            _padding: 0.0,
        };
        uniforms.apply_soft(soft);
        uniforms
    }

    /// Copy every uniform-backed soft parameter.
    pub fn apply_soft(&mut self, soft: &SoftParams) {
        self.top_color = soft.top_color.linear();
        self.bottom_color = soft.bottom_color.linear();
        self.intensity = soft.intensity;
        self.glow_amount = soft.glow_amount;
        self.pillar_width = soft.pillar_width;
        self.pillar_height = soft.pillar_height;
        self.noise_intensity = soft.noise_intensity;
        self.interactive = soft.interactive as u32;
    }

    /// Set simulation time and the spin derived from it.
    pub fn set_time(&mut self, time: f32, spin_rate: f32) {
        self.time = time;
        let (sin, cos) = (time * spin_rate).sin_cos();
        self.rot_cos = cos;
        self.rot_sin = sin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_wgsl_aligned() {
        assert_eq!(std::mem::size_of::<PillarUniforms>(), 80);
        assert_eq!(std::mem::size_of::<PillarUniforms>() % 16, 0);
        assert_eq!(std::mem::offset_of!(PillarUniforms, top_color), 16);
        assert_eq!(std::mem::offset_of!(PillarUniforms, bottom_color), 32);
        assert_eq!(std::mem::offset_of!(PillarUniforms, time), 48);
        assert_eq!(std::mem::offset_of!(PillarUniforms, interactive), 72);
    }

    #[test]
    fn test_new_applies_soft_params() {
        let soft = SoftParams {
            interactive: true,
            intensity: 0.7,
            ..Default::default()
        };
        let u = PillarUniforms::new(&soft, 640.0, 360.0);
        assert_eq!(u.resolution, [640.0, 360.0]);
        assert_eq!(u.interactive, 1);
        assert_eq!(u.intensity, 0.7);
        assert_eq!(u.top_color, soft.top_color.linear());
        assert_eq!((u.rot_cos, u.rot_sin), (1.0, 0.0));
    }

    #[test]
    fn test_set_time_updates_spin() {
        let mut u = PillarUniforms::new(&SoftParams::default(), 1.0, 1.0);
        u.set_time(10.0, 0.3);
        assert_eq!(u.time, 10.0);
        assert!((u.rot_cos - 3.0f32.cos()).abs() < 1e-6);
        assert!((u.rot_sin - 3.0f32.sin()).abs() < 1e-6);
    }
}
