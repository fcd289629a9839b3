//! Benchmarks for the CPU reference field and program generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use light_pillar::field::{self, FieldConstants, FieldSampler};
use light_pillar::gpu::{PillarUniforms, ProgramSource};
use light_pillar::{lookup_settings, resolve_quality, DeviceProfile, QualityTier, SoftParams};

fn bench_single_ray(c: &mut Criterion) {
    let mut group = c.benchmark_group("Field March");
    let profile = DeviceProfile::desktop();

    for tier in QualityTier::all() {
        let settings = lookup_settings(resolve_quality(*tier, &profile), &profile);
        let constants = FieldConstants::new(&settings, 0.0);
        let mut uniforms = PillarUniforms::new(&SoftParams::default(), 1920.0, 1080.0);
        uniforms.set_time(1.0, 0.3);

        group.bench_with_input(BenchmarkId::new("shade", tier.name()), tier, |b, _| {
            let sampler = FieldSampler::new(constants, &uniforms);
            b.iter(|| black_box(sampler.shade(black_box([960.0, 540.0]), [960.5, 540.5])));
        });
    }

    group.finish();
}

fn bench_reference_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reference Frame");
    group.sample_size(10);

    let profile = DeviceProfile::desktop();
    let settings = lookup_settings(resolve_quality(QualityTier::Low, &profile), &profile);
    let constants = FieldConstants::new(&settings, 25.0);
    let uniforms = PillarUniforms::new(&SoftParams::default(), 320.0, 180.0);

    group.bench_function("render_reference_160x90", |b| {
        b.iter(|| black_box(field::render_reference(constants, &uniforms, 160, 90)));
    });

    group.finish();
}

fn bench_program_generation(c: &mut Criterion) {
    let profile = DeviceProfile::desktop();
    let quality = resolve_quality(QualityTier::High, &profile);
    let settings = lookup_settings(quality, &profile);

    c.bench_function("generate_and_validate_high", |b| {
        b.iter(|| {
            let program = ProgramSource::generate(quality.into(), &settings, black_box(25.0));
            black_box(program.validate().is_ok())
        });
    });
}

criterion_group!(
    benches,
    bench_single_ray,
    bench_reference_frame,
    bench_program_generation
);
criterion_main!(benches);
