use crate::Material;
use std::sync::Arc;

/// Floats per interleaved vertex: position xyz, uv, normal xyz.
pub const VERTEX_FLOATS: usize = 8;
/// Bytes per interleaved vertex.
pub const VERTEX_STRIDE: u64 = (VERTEX_FLOATS * std::mem::size_of::<f32>()) as u64;
pub const POSITION_OFFSET: u64 = 0;
pub const UV_OFFSET: u64 = 12;
pub const NORMAL_OFFSET: u64 = 20;

/// Triangle-list geometry with its material.
///
/// The renderer uploads `vertices` once, the first time the mesh is drawn.
/// Edits made through [`MeshComponent::set_vertices`] afterwards are not
/// re-uploaded.
#[derive(Debug, Clone)]
pub struct MeshComponent {
    vertices: Vec<f32>,
    material: Arc<Material>,
}

impl MeshComponent {
    pub fn new(vertices: Vec<f32>, material: Arc<Material>) -> Self {
        Self { vertices, material }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn set_vertices(&mut self, vertices: Vec<f32>) {
        self.vertices = vertices;
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Number of vertices drawn; a trailing partial vertex counts as one and
    /// is zero-padded on upload.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len().div_ceil(VERTEX_FLOATS) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
