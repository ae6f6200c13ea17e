//! wgpu backend for the spacekit renderer.
//!
//! [`GpuContext`] owns the surface, device and queue; [`WgpuBackend`]
//! implements [`RenderBackend`](spacekit_render::RenderBackend) on top of it.
//!
//! # Invariants
//! - Device loss is latched by the device-lost callback and reported by
//!   `is_device_lost`; it is never cleared.
//! - A lost or outdated surface is reconfigured and the frame skipped.
//! - Pipeline validation errors are returned, not panicked on.

mod context;
mod gpu;
mod shaders;

pub use context::{GpuContext, GpuInitError};
pub use gpu::{DEPTH_FORMAT, WgpuBackend, WgpuFrame, WgpuPipeline};
pub use shaders::{BASE_SHADER, EmbeddedShaders};
