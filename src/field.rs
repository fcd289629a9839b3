//! The light-pillar distance field, evaluated on the CPU.
//!
//! This is the reference for the generated WGSL program: the constants here
//! are the ones the shader generator bakes in, and [`FieldSampler::shade`]
//! follows the fragment program step for step. It is used to pin the
//! algorithm in tests and benches and to render stills without a GPU.

use crate::gpu::uniforms::PillarUniforms;
use crate::quality::RenderSettings;
use image::RgbaImage;
use std::f32::consts::{E, PI};

/// Fixed rotation applied to each wave octave, in radians.
pub const WAVE_ROTATION: f32 = 0.4;
/// Size of the per-octave rotation table (the maximum octave count).
pub const WAVE_TABLE_LEN: usize = 4;
/// Sharpness of the smooth-minimum blend.
pub const BLEND_SHARPNESS: f32 = 4.0;
/// Rays stop once they travel this far.
pub const MAX_DEPTH: f32 = 50.0;
/// Rays stop once a step gets this small.
pub const HIT_EPSILON: f32 = 0.001;
pub const START_DEPTH: f32 = 0.1;
pub const ORIGIN_Z: f32 = -10.0;
/// Radius subtracted from the cosine lattice.
pub const LATTICE_RADIUS: f32 = 0.2;
pub const STEP_SCALE: f32 = 0.15;
pub const STEP_BIAS: f32 = 0.01;
/// Half-height of the vertical color gradient.
pub const GRADIENT_SPAN: f32 = 15.0;
/// Grain is `noise / NOISE_DIVISOR * noise_intensity`.
pub const NOISE_DIVISOR: f32 = 15.0;
/// tanh input clamp. tanh(10) is 1 to f32 precision.
pub const TANH_CLAMP: f32 = 10.0;

/// Per-octave rotation table as `[sin, cos]` pairs.
pub fn wave_table() -> [[f32; 2]; WAVE_TABLE_LEN] {
    let (sin, cos) = WAVE_ROTATION.sin_cos();
    [[sin, cos]; WAVE_TABLE_LEN]
}

/// Values a compiled program bakes in as constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConstants {
    pub iterations: u32,
    pub wave_iterations: u32,
    pub step_multiplier: f32,
    /// cos of the static pillar tilt.
    pub tilt_cos: f32,
    /// sin of the static pillar tilt.
    pub tilt_sin: f32,
}

impl FieldConstants {
    pub fn new(settings: &RenderSettings, pillar_rotation_degrees: f32) -> Self {
        let (tilt_sin, tilt_cos) = pillar_rotation_degrees.to_radians().sin_cos();
        Self {
            iterations: settings.iterations,
            wave_iterations: settings.wave_iterations.min(WAVE_TABLE_LEN as u32),
            step_multiplier: settings.step_multiplier,
            tilt_cos,
            tilt_sin,
        }
    }
}

/// Outcome of marching a single ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchResult {
    /// Accumulated glow before compression.
    pub accumulated: [f32; 3],
    /// Steps taken, including the terminating one.
    pub steps: u32,
    /// Depth reached when the march ended.
    pub depth: f32,
}

/// Smooth union of the tube bound and the lattice field, turned into a step length.
pub fn blended_step(radial: f32, lattice: f32) -> f32 {
    let k = BLEND_SHARPNESS;
    let h = (k - (-radial - (-lattice)).abs()).max(0.0);
    let d = -((-radial).min(-lattice) - h * h * 0.25 / k);
    d.abs() * STEP_SCALE + STEP_BIAS
}

/// Deterministic per-pixel grain in `[0, 1)`.
pub fn noise(coord: [f32; 2]) -> f32 {
    let rx = E * (E * coord[0]).sin();
    let ry = E * (E * coord[1]).sin();
    fract(rx * ry * (1.0 + coord[0]))
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn smoothstep(low: f32, high: f32, x: f32) -> f32 {
    let t = ((x - low) / (high - low)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn normalize3(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Evaluates the field for one frame's uniforms.
pub struct FieldSampler<'a> {
    constants: FieldConstants,
    uniforms: &'a PillarUniforms,
    table: [[f32; 2]; WAVE_TABLE_LEN],
}

impl<'a> FieldSampler<'a> {
    pub fn new(constants: FieldConstants, uniforms: &'a PillarUniforms) -> Self {
        Self {
            constants,
            uniforms,
            table: wave_table(),
        }
    }

    /// Ray direction for a fragment, in logical surface coordinates.
    pub fn ray_direction(&self, frag: [f32; 2]) -> [f32; 3] {
        let [w, h] = self.uniforms.resolution;
        let x = (frag[0] * 2.0 - w) / h;
        let y = (frag[1] * 2.0 - h) / h;
        let (c, s) = (self.constants.tilt_cos, self.constants.tilt_sin);
        normalize3([x * c - y * s, x * s + y * c, 1.0])
    }

    /// Rotation pair used around the vertical axis this frame.
    fn spin(&self) -> (f32, f32) {
        let u = self.uniforms;
        let [mx, my] = u.mouse;
        if u.interactive != 0 && (mx * mx + my * my).sqrt() > 0.0 {
            let angle = mx * PI * 2.0;
            (angle.cos(), angle.sin())
        } else {
            (u.rot_cos, u.rot_sin)
        }
    }

    /// March one ray and return the raw accumulation.
    pub fn march(&self, direction: [f32; 3]) -> MarchResult {
        let u = self.uniforms;
        let (rot_cos, rot_sin) = self.spin();
        let mut color = [0.0f32; 3];
        let mut depth = START_DEPTH;
        let mut steps = 0;

        for _ in 0..self.constants.iterations {
            steps += 1;
            let mut pos = [
                direction[0] * depth,
                direction[1] * depth,
                ORIGIN_Z + direction[2] * depth,
            ];
            let nx = pos[0] * rot_cos - pos[2] * rot_sin;
            let nz = pos[0] * rot_sin + pos[2] * rot_cos;
            pos[0] = nx;
            pos[2] = nz;

            let mut deformed = pos;
            deformed[1] = deformed[1] * u.pillar_height + u.time;

            let mut frequency = 1.0;
            let mut amplitude = 1.0;
            for j in 0..self.constants.wave_iterations as usize {
                let [ws, wc] = self.table[j];
                let wx = deformed[0] * wc - deformed[2] * ws;
                let wz = deformed[0] * ws + deformed[2] * wc;
                deformed[0] = wx;
                deformed[2] = wz;

                let phase = u.time * j as f32 * 2.0;
                // cos(deformed.zxy * frequency - phase)
                let osc = [
                    (deformed[2] * frequency - phase).cos(),
                    (deformed[0] * frequency - phase).cos(),
                    (deformed[1] * frequency - phase).cos(),
                ];
                for (d, o) in deformed.iter_mut().zip(osc) {
                    *d += o * amplitude;
                }
                frequency *= 2.0;
                amplitude *= 0.5;
            }

            let cx = deformed[0].cos();
            let cz = deformed[2].cos();
            let lattice = (cx * cx + cz * cz).sqrt() - LATTICE_RADIUS;
            let radial = (pos[0] * pos[0] + pos[2] * pos[2]).sqrt() - u.pillar_width;
            let step = blended_step(radial, lattice);

            let t = 1.0 - smoothstep(-GRADIENT_SPAN, GRADIENT_SPAN, pos[1]);
            let gradient = mix3(u.bottom_color, u.top_color, t);
            for (c, g) in color.iter_mut().zip(gradient) {
                *c += g / step;
            }

            if step < HIT_EPSILON || depth > MAX_DEPTH {
                break;
            }
            depth += step * self.constants.step_multiplier;
        }

        MarchResult {
            accumulated: color,
            steps,
            depth,
        }
    }

    /// Final linear color for a fragment.
    ///
    /// `frag` is in logical coordinates (what the program derives from its
    /// interpolated uv); `pixel` is the physical pixel center fed to the grain.
    pub fn shade(&self, frag: [f32; 2], pixel: [f32; 2]) -> [f32; 3] {
        let u = self.uniforms;
        let result = self.march(self.ray_direction(frag));
        let width_norm = u.pillar_width / 3.0;
        let grain = noise(pixel) / NOISE_DIVISOR * u.noise_intensity;
        result.accumulated.map(|c| {
            let compressed = (c * u.glow_amount / width_norm).min(TANH_CLAMP).tanh();
            (compressed - grain) * u.intensity
        })
    }
}

/// Render a full frame on the CPU.
///
/// `width` x `height` is the physical target size; the logical size comes
/// from the uniforms' resolution, exactly as on the GPU.
pub fn render_reference(
    constants: FieldConstants,
    uniforms: &PillarUniforms,
    width: u32,
    height: u32,
) -> RgbaImage {
    let sampler = FieldSampler::new(constants, uniforms);
    let [lw, lh] = uniforms.resolution;
    RgbaImage::from_fn(width, height, |px, py| {
        let pixel = [px as f32 + 0.5, py as f32 + 0.5];
        // uv origin is bottom-left, pixel rows grow downward
        let uv = [pixel[0] / width as f32, 1.0 - pixel[1] / height as f32];
        let rgb = sampler.shade([uv[0] * lw, uv[1] * lh], pixel);
        let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        image::Rgba([r, g, b, 255])
    })
}
