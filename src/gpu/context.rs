//! GPU context initialization and management.

use std::sync::Arc;
use wgpu::{Adapter, Device, Instance, PowerPreference, Queue};

/// Errors that can occur during GPU operations.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("Readback failed: {0}")]
    Readback(String),
    #[error("Graphics session already released")]
    Released,
}

/// Backends tried for both probing and rendering.
pub(crate) fn default_backends() -> wgpu::Backends {
    wgpu::Backends::METAL | wgpu::Backends::VULKAN | wgpu::Backends::DX12 | wgpu::Backends::GL
}

/// GPU context holding device and queue for rendering.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a new GPU context for headless rendering.
    pub async fn new(power_preference: PowerPreference) -> Result<Self, GpuError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: default_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("light-pillar"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Blocking variant of [`GpuContext::new`].
    pub fn new_blocking(power_preference: PowerPreference) -> Result<Self, GpuError> {
        pollster::block_on(Self::new(power_preference))
    }

    /// Get info about the GPU adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gpu_context_creation() {
        let ctx = GpuContext::new(PowerPreference::HighPerformance).await;
        // May fail on CI without GPU, so just check it doesn't panic
        if let Ok(ctx) = ctx {
            let info = ctx.adapter_info();
            assert!(!info.name.is_empty());
        }
    }

    #[test]
    fn test_error_messages() {
        let err = GpuError::ShaderCompile("bad token".to_string());
        assert_eq!(err.to_string(), "Shader compilation failed: bad token");
        assert_eq!(GpuError::NoAdapter.to_string(), "No suitable GPU adapter found");
    }
}
