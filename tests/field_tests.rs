//! Integration tests for program generation and the CPU reference field.

use light_pillar::field::{self, FieldConstants, FieldSampler};
use light_pillar::gpu::{validate_wgsl, GpuError, PillarUniforms, ProgramCache, ProgramSource};
use light_pillar::{
    lookup_settings, resolve_quality, DeviceProfile, QualityTier, RenderSettings, SoftParams,
};

fn settings(tier: QualityTier) -> RenderSettings {
    let profile = DeviceProfile::desktop();
    lookup_settings(resolve_quality(tier, &profile), &profile)
}

fn uniforms(soft: &SoftParams, width: f32, height: f32, time: f32) -> PillarUniforms {
    let mut u = PillarUniforms::new(soft, width, height);
    u.set_time(time, 0.3);
    u
}

fn quiet() -> SoftParams {
    SoftParams {
        noise_intensity: 0.0,
        ..SoftParams::default()
    }
}

// ==================== Program generation ====================

#[test]
fn test_programs_differ_only_by_tier_constants() {
    let profile = DeviceProfile::desktop();
    let sources: Vec<ProgramSource> = QualityTier::all()
        .iter()
        .map(|tier| {
            let quality = resolve_quality(*tier, &profile);
            ProgramSource::generate(quality.into(), &lookup_settings(quality, &profile), 0.0)
        })
        .collect();

    assert!(sources[0].wgsl.contains("const ITERATIONS: i32 = 24;"));
    assert!(sources[1].wgsl.contains("const ITERATIONS: i32 = 40;"));
    assert!(sources[2].wgsl.contains("const ITERATIONS: i32 = 80;"));
    assert!(sources[1].wgsl.contains("const STEP_MULT: f32 = 1.2;"));
    for source in &sources {
        assert!(source.wgsl.contains("fn fs_main"));
        assert!(source.wgsl.contains("fn vs_main"));
        validate_wgsl(&source.wgsl).unwrap();
    }
}

#[test]
fn test_tilt_is_baked_into_program() {
    let profile = DeviceProfile::desktop();
    let quality = resolve_quality(QualityTier::High, &profile);
    let s = lookup_settings(quality, &profile);

    let straight = ProgramSource::generate(quality.into(), &s, 0.0);
    let tilted = ProgramSource::generate(quality.into(), &s, 25.0);
    assert_ne!(straight.wgsl, tilted.wgsl);
    assert!((tilted.constants.tilt_cos - 25f32.to_radians().cos()).abs() < 1e-6);
    assert!((tilted.constants.tilt_sin - 25f32.to_radians().sin()).abs() < 1e-6);
}

#[test]
fn test_invalid_wgsl_reports_shader_compile() {
    // Parses, but fails type checking.
    let source = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
    match validate_wgsl(source) {
        Err(GpuError::ShaderCompile(message)) => assert!(!message.is_empty()),
        other => panic!("expected a shader compile error, got {other:?}"),
    }
}

#[test]
fn test_cache_keys_on_variant_and_rotation() {
    let profile = DeviceProfile::desktop();
    let mut cache = ProgramCache::new();
    for tier in QualityTier::all() {
        let quality = resolve_quality(*tier, &profile);
        let s = lookup_settings(quality, &profile);
        cache.get_or_build(quality, &s, 0.0).unwrap();
        cache.get_or_build(quality, &s, 0.0).unwrap();
        cache.get_or_build(quality, &s, 45.0).unwrap();
    }
    assert_eq!(cache.len(), 6);
}

// ==================== CPU reference field ====================

#[test]
fn test_reference_is_deterministic() {
    let constants = FieldConstants::new(&settings(QualityTier::Low), 0.0);
    let u = uniforms(&SoftParams::default(), 48.0, 27.0, 1.5);
    let a = field::render_reference(constants, &u, 24, 14);
    let b = field::render_reference(constants, &u, 24, 14);
    assert_eq!(a.as_raw(), b.as_raw());
    assert_eq!(a.dimensions(), (24, 14));
}

#[test]
fn test_zero_glow_is_black() {
    let constants = FieldConstants::new(&settings(QualityTier::Low), 0.0);
    let soft = SoftParams {
        glow_amount: 0.0,
        ..SoftParams::default()
    };
    let image = field::render_reference(constants, &uniforms(&soft, 32.0, 18.0, 0.7), 32, 18);
    for pixel in image.pixels() {
        assert_eq!(&pixel.0[..3], &[0, 0, 0]);
        assert_eq!(pixel.0[3], 255);
    }
}

#[test]
fn test_brightness_grows_with_glow() {
    let constants = FieldConstants::new(&settings(QualityTier::Medium), 0.0);
    let dim = SoftParams {
        glow_amount: 0.001,
        ..quiet()
    };
    let bright = SoftParams {
        glow_amount: 0.01,
        ..quiet()
    };
    let a = field::render_reference(constants, &uniforms(&dim, 32.0, 18.0, 2.0), 32, 18);
    let b = field::render_reference(constants, &uniforms(&bright, 32.0, 18.0, 2.0), 32, 18);

    for (pa, pb) in a.pixels().zip(b.pixels()) {
        for c in 0..3 {
            assert!(pb.0[c] >= pa.0[c]);
        }
    }
    let sum = |img: &image::RgbaImage| img.as_raw().iter().map(|v| *v as u64).sum::<u64>();
    assert!(sum(&b) > sum(&a));
}

#[test]
fn test_intensity_scales_output() {
    let constants = FieldConstants::new(&settings(QualityTier::Low), 0.0);
    let u = uniforms(&quiet(), 64.0, 36.0, 3.0);
    let sampler = FieldSampler::new(constants, &u);
    let full = sampler.shade([32.0, 18.0], [32.5, 18.5]);

    let half_soft = SoftParams {
        intensity: 0.5,
        ..quiet()
    };
    let half_u = uniforms(&half_soft, 64.0, 36.0, 3.0);
    let half = FieldSampler::new(constants, &half_u).shade([32.0, 18.0], [32.5, 18.5]);

    for c in 0..3 {
        assert!((half[c] - full[c] * 0.5).abs() < 1e-6);
    }
}

#[test]
fn test_march_stays_within_bounds() {
    for tier in QualityTier::all() {
        let s = settings(*tier);
        let constants = FieldConstants::new(&s, 0.0);
        let u = uniforms(&SoftParams::default(), 64.0, 36.0, 4.2);
        let sampler = FieldSampler::new(constants, &u);
        for frag in [[0.0, 0.0], [32.0, 18.0], [64.0, 36.0], [10.0, 30.0]] {
            let result = sampler.march(sampler.ray_direction(frag));
            assert!(result.steps >= 1 && result.steps <= s.iterations);
            assert!(result.accumulated.iter().all(|c| c.is_finite() && *c >= 0.0));
        }
    }
}

#[test]
fn test_tanh_clamp_keeps_output_finite() {
    let constants = FieldConstants::new(&settings(QualityTier::High), 0.0);
    let soft = SoftParams {
        glow_amount: 1.0e6,
        ..quiet()
    };
    let u = uniforms(&soft, 16.0, 9.0, 0.0);
    let rgb = FieldSampler::new(constants, &u).shade([8.0, 4.5], [8.5, 4.5]);
    for c in rgb {
        assert!(c.is_finite());
        assert!(c <= 1.0);
    }
}
