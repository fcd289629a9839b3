//! Fragment program generation and validation.
//!
//! Loop bounds, the step multiplier, the pillar tilt and the wave rotation
//! table are baked into the WGSL source as constants. Each [`ProgramVariant`]
//! therefore compiles to its own program; changing any of those values means
//! a new program, never a uniform update.

use super::context::GpuError;
use crate::field::{self, FieldConstants};
use crate::quality::{EffectiveQuality, Precision, QualityTier, RenderSettings};
use std::collections::HashMap;
use std::f32::consts::{E, PI};
use std::sync::Arc;

/// One compiled program per effective quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramVariant {
    Low,
    Medium,
    High,
}

impl From<EffectiveQuality> for ProgramVariant {
    fn from(quality: EffectiveQuality) -> Self {
        match quality.tier() {
            QualityTier::Low => Self::Low,
            QualityTier::Medium => Self::Medium,
            QualityTier::High => Self::High,
        }
    }
}

impl ProgramVariant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Generated WGSL plus the constants it was generated from.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub variant: ProgramVariant,
    pub constants: FieldConstants,
    pub precision: Precision,
    pub wgsl: String,
}

impl ProgramSource {
    /// Generate the program for a variant. The source is not validated yet.
    pub fn generate(
        variant: ProgramVariant,
        settings: &RenderSettings,
        pillar_rotation_degrees: f32,
    ) -> Self {
        let degrees = if pillar_rotation_degrees.is_finite() {
            pillar_rotation_degrees
        } else {
            0.0
        };
        let constants = FieldConstants::new(settings, degrees);
        let wgsl = build_wgsl(variant, &constants, settings.precision);
        Self {
            variant,
            constants,
            precision: settings.precision,
            wgsl,
        }
    }

    /// Parse and validate the source with naga.
    pub fn validate(&self) -> Result<(), GpuError> {
        validate_wgsl(&self.wgsl)
    }
}

/// Parse and validate WGSL, reporting failures as [`GpuError::ShaderCompile`].
pub fn validate_wgsl(source: &str) -> Result<(), GpuError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| GpuError::ShaderCompile(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| GpuError::ShaderCompile(e.emit_to_string(source)))?;
    Ok(())
}

/// Format an f32 as a WGSL float literal.
fn float_literal(value: f32) -> String {
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

fn build_wgsl(variant: ProgramVariant, c: &FieldConstants, precision: Precision) -> String {
    let f = float_literal;
    let table = field::wave_table()
        .iter()
        .map(|[s, co]| format!("    vec2<f32>({}, {})", f(*s), f(*co)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"// light-pillar fragment program: {variant} tier, {precision} precision

struct PillarUniforms {{
    resolution: vec2<f32>,
    mouse: vec2<f32>,
    top_color: vec3<f32>,
    intensity: f32,
    bottom_color: vec3<f32>,
    glow_amount: f32,
    time: f32,
    pillar_width: f32,
    pillar_height: f32,
    noise_intensity: f32,
    rot_cos: f32,
    rot_sin: f32,
    interactive: u32,
    padding: f32,
}}

@group(0) @binding(0) var<uniform> u: PillarUniforms;

struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {{
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}}

const PI: f32 = {pi};
const E: f32 = {e};
const EPSILON: f32 = {epsilon};
const MAX_DEPTH: f32 = {max_depth};
const START_DEPTH: f32 = {start_depth};
const ORIGIN_Z: f32 = {origin_z};
const BLEND_K: f32 = {blend_k};
const LATTICE_RADIUS: f32 = {lattice_radius};
const STEP_SCALE: f32 = {step_scale};
const STEP_BIAS: f32 = {step_bias};
const GRADIENT_SPAN: f32 = {gradient_span};
const NOISE_DIVISOR: f32 = {noise_divisor};
const TANH_CLAMP: f32 = {tanh_clamp};

const ITERATIONS: i32 = {iterations};
const WAVE_ITERATIONS: i32 = {wave_iterations};
const STEP_MULT: f32 = {step_mult};
const TILT: vec2<f32> = vec2<f32>({tilt_cos}, {tilt_sin});

var<private> wave_table: array<vec2<f32>, {table_len}> = array<vec2<f32>, {table_len}>(
{table}
);

fn grain(coord: vec2<f32>) -> f32 {{
    let r = E * sin(E * coord);
    return fract(r.x * r.y * (1.0 + coord.x));
}}

fn blended_step(radial: f32, lattice: f32) -> f32 {{
    let h = max(BLEND_K - abs(-radial - (-lattice)), 0.0);
    let d = -(min(-radial, -lattice) - h * h * 0.25 / BLEND_K);
    return abs(d) * STEP_SCALE + STEP_BIAS;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let frag = in.uv * u.resolution;
    let base = (frag * 2.0 - u.resolution) / u.resolution.y;
    let uv = vec2<f32>(base.x * TILT.x - base.y * TILT.y, base.x * TILT.y + base.y * TILT.x);
    let direction = normalize(vec3<f32>(uv, 1.0));
    let origin = vec3<f32>(0.0, 0.0, ORIGIN_Z);

    var spin = vec2<f32>(u.rot_cos, u.rot_sin);
    if (u.interactive != 0u && length(u.mouse) > 0.0) {{
        let angle = u.mouse.x * PI * 2.0;
        spin = vec2<f32>(cos(angle), sin(angle));
    }}

    var color = vec3<f32>(0.0, 0.0, 0.0);
    var depth = START_DEPTH;
    for (var i = 0; i < ITERATIONS; i++) {{
        var pos = origin + direction * depth;
        pos = vec3<f32>(pos.x * spin.x - pos.z * spin.y, pos.y, pos.x * spin.y + pos.z * spin.x);

        var deformed = pos;
        deformed.y = deformed.y * u.pillar_height + u.time;

        var frequency = 1.0;
        var amplitude = 1.0;
        for (var j = 0; j < WAVE_ITERATIONS; j++) {{
            let w = wave_table[j];
            deformed = vec3<f32>(
                deformed.x * w.y - deformed.z * w.x,
                deformed.y,
                deformed.x * w.x + deformed.z * w.y
            );
            let phase = u.time * f32(j) * 2.0;
            deformed += cos(deformed.zxy * frequency - vec3<f32>(phase)) * amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }}

        let lattice = length(cos(deformed.xz)) - LATTICE_RADIUS;
        let radial = length(pos.xz) - u.pillar_width;
        let advance = blended_step(radial, lattice);

        let t = 1.0 - smoothstep(-GRADIENT_SPAN, GRADIENT_SPAN, pos.y);
        color += mix(u.bottom_color, u.top_color, vec3<f32>(t)) / advance;

        if (advance < EPSILON || depth > MAX_DEPTH) {{
            break;
        }}
        depth += advance * STEP_MULT;
    }}

    let width_norm = u.pillar_width / 3.0;
    var shaded = tanh(min(color * u.glow_amount / width_norm, vec3<f32>(TANH_CLAMP)));
    shaded -= vec3<f32>(grain(in.position.xy) / NOISE_DIVISOR * u.noise_intensity);
    return vec4<f32>(shaded * u.intensity, 1.0);
}}
"#,
        variant = variant.name(),
        precision = precision.qualifier(),
        pi = f(PI),
        e = f(E),
        epsilon = f(field::HIT_EPSILON),
        max_depth = f(field::MAX_DEPTH),
        start_depth = f(field::START_DEPTH),
        origin_z = f(field::ORIGIN_Z),
        blend_k = f(field::BLEND_SHARPNESS),
        lattice_radius = f(field::LATTICE_RADIUS),
        step_scale = f(field::STEP_SCALE),
        step_bias = f(field::STEP_BIAS),
        gradient_span = f(field::GRADIENT_SPAN),
        noise_divisor = f(field::NOISE_DIVISOR),
        tanh_clamp = f(field::TANH_CLAMP),
        iterations = c.iterations,
        wave_iterations = c.wave_iterations,
        step_mult = f(c.step_multiplier),
        tilt_cos = f(c.tilt_cos),
        tilt_sin = f(c.tilt_sin),
        table_len = field::WAVE_TABLE_LEN,
        table = table,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ProgramKey {
    variant: ProgramVariant,
    rotation_bits: u32,
}

/// Validated programs keyed by variant and tilt.
///
/// A rebuild with the same hard parameters reuses the validated source
/// instead of regenerating and re-validating it.
#[derive(Debug, Default)]
pub struct ProgramCache {
    entries: HashMap<ProgramKey, Arc<ProgramSource>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the validated program for these parameters, building it on first use.
    pub fn get_or_build(
        &mut self,
        quality: EffectiveQuality,
        settings: &RenderSettings,
        pillar_rotation_degrees: f32,
    ) -> Result<Arc<ProgramSource>, GpuError> {
        let variant = ProgramVariant::from(quality);
        let key = ProgramKey {
            variant,
            rotation_bits: pillar_rotation_degrees.to_bits(),
        };
        if let Some(program) = self.entries.get(&key) {
            return Ok(Arc::clone(program));
        }

        let program = ProgramSource::generate(variant, settings, pillar_rotation_degrees);
        program.validate()?;
        log::debug!(
            "validated {} program ({} iterations, {} wave octaves)",
            variant.name(),
            program.constants.iterations,
            program.constants.wave_iterations
        );
        let program = Arc::new(program);
        self.entries.insert(key, Arc::clone(&program));
        Ok(program)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
