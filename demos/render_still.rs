//! Example: Run the pillar headlessly for a second and save the last frame.
//!
//! Falls back to the CPU reference renderer when no GPU is available.
//!
//! Run with:
//!     cargo run --example render_still -- [config.json] [output.png]

use anyhow::Context;
use light_pillar::field::{self, FieldConstants};
use light_pillar::lifecycle::{HeadlessHost, LightPillar, PillarState};
use light_pillar::{
    lookup_settings, resolve_quality, DeviceProfile, GpuSessionFactory, PillarConfig,
    PillarUniforms,
};
use std::time::{Duration, Instant};

const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;
const REFRESH_RATE: u32 = 60;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => PillarConfig::from_path(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => PillarConfig::festival(),
    };
    let output = args.next().unwrap_or_else(|| "light_pillar.png".to_string());

    println!("Light Pillar - Headless Still");
    println!("=============================\n");

    let profile = DeviceProfile::detect();
    println!("Device profile:");
    println!("  Mobile: {}", profile.is_mobile);
    println!("  Low-end: {}", profile.is_low_end);
    println!("  Processors: {:?}\n", profile.logical_processors);

    let mut pillar = LightPillar::new(
        GpuSessionFactory::new(),
        HeadlessHost::new(WIDTH, HEIGHT, REFRESH_RATE),
        profile,
        config.clone(),
    );

    let t0 = Instant::now();
    pillar.mount(t0);

    let image = match pillar.state() {
        PillarState::Active => {
            let (tally, _) = pillar.run_for(t0, Duration::from_secs(1));
            println!("Simulated 1s at {REFRESH_RATE} Hz:");
            println!("  Drawn: {}", tally.drawn);
            println!("  Throttled: {}", tally.throttled);
            println!("  Simulation time: {:.3}\n", pillar.time());

            let session = pillar
                .session_mut()
                .context("active pillar has no session")?;
            println!("Adapter: {}", session.adapter_info().name);
            session.capture().context("failed to capture frame")?
        }
        state => {
            log::warn!("GPU path unavailable ({state:?}), rendering on the CPU");
            let quality = resolve_quality(config.hard.quality, &profile);
            let settings = lookup_settings(quality, &profile);
            let constants = FieldConstants::new(&settings, config.hard.pillar_rotation);

            // A reduced frame keeps the CPU path quick.
            let (w, h) = (WIDTH / 4.0, HEIGHT / 4.0);
            let mut uniforms = PillarUniforms::new(&config.soft, w, h);
            uniforms.set_time(0.016 * config.soft.rotation_speed * 60.0, 0.3);
            field::render_reference(constants, &uniforms, w as u32, h as u32)
        }
    };

    image
        .save(&output)
        .with_context(|| format!("failed to write {output}"))?;
    println!("Saved {}x{} frame to {output}", image.width(), image.height());

    pillar.unmount();
    Ok(())
}
