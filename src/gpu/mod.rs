//! GPU rendering using wgpu.
//!
//! Provides headless rendering of the pillar program into an offscreen
//! target, with naga validation of every generated program before the
//! device sees it.

pub mod context;
pub mod layouts;
pub mod pipeline;
pub mod probe;
pub mod program;
pub mod session;
pub mod textures;
pub mod uniforms;

pub use context::{GpuContext, GpuError};
pub use pipeline::PillarPipeline;
pub use probe::{is_graphics_supported, CapabilityProbe};
pub use program::{validate_wgsl, ProgramCache, ProgramSource, ProgramVariant};
pub use session::{GpuSession, GpuSessionFactory};
pub use uniforms::PillarUniforms;
