use crate::RenderError;
use serde::{Deserialize, Serialize};
use spacekit_ecs::{Bitmap, FilterMode};

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferUsage {
    Uniform,
    Storage,
    Vertex,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub size: u64,
    pub usage: BufferUsage,
}

/// Everything the backend needs to build the forward pipeline. Bind-group
/// and vertex layouts are fixed by [`crate::layout`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
}

/// One entry of a bind group, in binding order.
pub enum BindingResource<'a, B: RenderBackend> {
    Buffer(&'a B::Buffer),
    Sampler(&'a B::Sampler),
    Texture(&'a B::Texture),
}

/// A command recorded into the single forward pass.
pub enum PassCommand<'a, B: RenderBackend> {
    SetBindGroup {
        index: u32,
        bind_group: &'a B::BindGroup,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: &'a B::Buffer,
    },
    Draw {
        vertex_count: u32,
        instance: u32,
    },
}

/// A render pass clearing color and depth, then running `commands` in order.
pub struct PassDesc<'a, B: RenderBackend> {
    pub target: &'a B::Target,
    pub depth: &'a B::DepthTarget,
    pub pipeline: &'a B::Pipeline,
    pub clear_color: [f64; 4],
    pub commands: &'a [PassCommand<'a, B>],
}

/// The graphics primitives the renderer is built on.
///
/// Resource creation is infallible from the caller's point of view; the
/// backend surfaces device-level failure through [`RenderBackend::is_device_lost`]
/// and [`RenderBackend::acquire_target`].
pub trait RenderBackend: Sized {
    type Buffer;
    type Texture;
    type Sampler;
    type BindGroup;
    type Pipeline;
    type DepthTarget;
    type Target;

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> Result<Self::Pipeline, RenderError>;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Self::Buffer;

    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    /// Allocate a texture matching `bitmap` and upload its pixels.
    fn create_texture(&self, label: &str, bitmap: &Bitmap) -> Self::Texture;

    fn create_sampler(&self, min_filter: FilterMode, mag_filter: FilterMode) -> Self::Sampler;

    /// Build bind group `group` of `pipeline`'s layout from `resources`,
    /// assigned to bindings 0, 1, 2... in order.
    fn create_bind_group(
        &self,
        label: &str,
        pipeline: &Self::Pipeline,
        group: u32,
        resources: &[BindingResource<'_, Self>],
    ) -> Self::BindGroup;

    fn create_depth_target(&self, width: u32, height: u32) -> Self::DepthTarget;

    /// Next image to draw into.
    fn acquire_target(&self) -> Result<Self::Target, RenderError>;

    /// Record and submit one pass. Does not wait for the GPU.
    fn submit_pass(&self, pass: &PassDesc<'_, Self>);

    fn present(&self, target: Self::Target);

    fn is_device_lost(&self) -> bool;
}
