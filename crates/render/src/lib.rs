//! Backend-agnostic forward renderer.
//!
//! [`Renderer`] maps a [`Scene`](spacekit_scene::Scene) onto persistent GPU
//! resources through a [`RenderBackend`]. Resources are cached by identity
//! ([`BindGroupsManager`], [`VertexManager`]) and their contents rewritten
//! every frame.
//!
//! # Invariants
//! - Renderer never mutates the world.
//! - One pass per frame: clear, bind scene group once, one draw per mesh.
//! - GPU objects are allocated on first sight of an identity, never per frame.
//! - Resizes take effect at frame boundaries only.
//!
//! [`HeadlessBackend`] records every backend call instead of touching a GPU;
//! the wgpu implementation lives in `spacekit-render-wgpu`.

mod backend;
pub mod bind_groups;
mod error;
pub mod headless;
pub mod layout;
mod renderer;
mod shader;
pub mod vertex;

pub use backend::{
    BindingResource, BufferDesc, BufferUsage, PassCommand, PassDesc, PipelineDesc, RenderBackend,
};
pub use bind_groups::{BindGroupsManager, CacheStats};
pub use error::{RenderError, ShaderError};
pub use headless::HeadlessBackend;
pub use renderer::{FrameStats, Renderer, RendererConfig, RendererState};
pub use shader::ShaderSource;
pub use vertex::VertexManager;
