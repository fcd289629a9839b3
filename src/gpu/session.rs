//! Headless wgpu session that draws the pillar into an offscreen target.

use super::context::{GpuContext, GpuError};
use super::pipeline::PillarPipeline;
use super::probe::CapabilityProbe;
use super::program::{ProgramCache, ProgramSource};
use super::textures::{ReadbackBuffer, RenderTarget};
use super::uniforms::PillarUniforms;
use crate::lifecycle::session::{physical_size, RenderSession, SessionFactory, SessionSpec};
use image::RgbaImage;
use std::sync::Arc;
use wgpu::{BindGroup, TextureFormat};

/// Offscreen target format. The program output is written as-is.
pub const TARGET_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Live GPU resources for one mounted pillar.
pub struct GpuSession {
    ctx: GpuContext,
    program: Arc<ProgramSource>,
    pipeline: PillarPipeline,
    bind_group: BindGroup,
    target: RenderTarget,
    pixel_ratio: f32,
    logical_size: (f32, f32),
    frames_drawn: u64,
    released: bool,
}

impl GpuSession {
    /// Build a session on an existing context from a validated program.
    pub fn new(
        ctx: GpuContext,
        program: Arc<ProgramSource>,
        spec: &SessionSpec,
        uniforms: &PillarUniforms,
    ) -> Self {
        let pipeline = PillarPipeline::new(&ctx.device, &ctx.queue, TARGET_FORMAT, &program);
        let bind_group = pipeline.create_bind_group(&ctx.device);
        let (width, height) = spec.physical_size(spec.width, spec.height);
        let target = RenderTarget::for_output(&ctx.device, "pillar_target", width, height, TARGET_FORMAT);
        pipeline.write_uniforms(&ctx.queue, uniforms);

        Self {
            ctx,
            program,
            pipeline,
            bind_group,
            target,
            pixel_ratio: spec.settings.pixel_ratio,
            logical_size: (spec.width, spec.height),
            frames_drawn: 0,
            released: false,
        }
    }

    /// Physical size of the render target.
    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    pub fn logical_size(&self) -> (f32, f32) {
        self.logical_size
    }

    pub fn program(&self) -> &ProgramSource {
        &self.program
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }

    /// Draw one frame and read it back.
    pub fn capture(&mut self) -> Result<RgbaImage, GpuError> {
        if self.released {
            return Err(GpuError::Released);
        }
        let (width, height) = self.target.size();
        let readback = ReadbackBuffer::new(&self.ctx.device, width, height);

        let mut encoder = self.encode_pass("capture_encoder");
        readback.copy_from(&mut encoder, &self.target);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.frames_drawn += 1;

        let pixels = readback.read_pixels(&self.ctx.device)?;
        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| GpuError::Readback("pixel buffer does not match target size".into()))
    }

    fn encode_pass(&self, label: &str) -> wgpu::CommandEncoder {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pillar_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target.view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.pipeline.vertex_buffer.slice(..));
            render_pass.draw(0..4, 0..1);
        }

        encoder
    }
}

impl RenderSession for GpuSession {
    fn write_uniforms(&mut self, uniforms: &PillarUniforms) {
        if self.released {
            return;
        }
        self.pipeline.write_uniforms(&self.ctx.queue, uniforms);
    }

    fn draw(&mut self) -> Result<(), GpuError> {
        if self.released {
            return Err(GpuError::Released);
        }
        let encoder = self.encode_pass("pillar_encoder");
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.frames_drawn += 1;
        Ok(())
    }

    fn resize(&mut self, width: f32, height: f32) {
        if self.released {
            return;
        }
        self.logical_size = (width, height);
        let (pw, ph) = physical_size(width, height, self.pixel_ratio);
        if (pw, ph) == self.target.size() {
            return;
        }
        log::debug!("resizing pillar target to {pw}x{ph} ({width}x{height} logical)");
        self.target.destroy();
        self.target = RenderTarget::for_output(&self.ctx.device, "pillar_target", pw, ph, TARGET_FORMAT);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.target.destroy();
        self.pipeline.destroy();
        self.ctx.device.destroy();
        log::debug!("released pillar session after {} frames", self.frames_drawn);
    }
}

impl Drop for GpuSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Creates [`GpuSession`]s, one wgpu device per session.
#[derive(Debug, Default)]
pub struct GpuSessionFactory {
    probe: CapabilityProbe,
    programs: ProgramCache,
}

impl GpuSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with a caller-supplied capability probe.
    pub fn with_probe(probe: CapabilityProbe) -> Self {
        Self {
            probe,
            programs: ProgramCache::new(),
        }
    }

    pub fn programs(&self) -> &ProgramCache {
        &self.programs
    }
}

impl SessionFactory for GpuSessionFactory {
    type Session = GpuSession;

    fn is_supported(&self) -> bool {
        self.probe.is_supported()
    }

    fn create_session(
        &mut self,
        spec: &SessionSpec,
        uniforms: &PillarUniforms,
    ) -> Result<GpuSession, GpuError> {
        let program = self
            .programs
            .get_or_build(spec.quality, &spec.settings, spec.pillar_rotation)?;

        let ctx = GpuContext::new_blocking(spec.quality.power_preference())?;
        let info = ctx.adapter_info();
        log::info!(
            "pillar session on {} ({:?}): {} tier, {} iterations, pixel ratio {}, {} fps",
            info.name,
            info.backend,
            program.variant.name(),
            spec.settings.iterations,
            spec.settings.pixel_ratio,
            spec.settings.target_fps
        );

        Ok(GpuSession::new(ctx, program, spec, uniforms))
    }
}
