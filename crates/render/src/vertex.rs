use crate::{BufferDesc, BufferUsage, RenderBackend};
use spacekit_common::ComponentId;
use spacekit_ecs::{MeshComponent, VERTEX_FLOATS, VERTEX_STRIDE};
use std::collections::BTreeMap;

struct VertexEntry<B: RenderBackend> {
    buffer: B::Buffer,
    vertex_count: u32,
}

/// Static vertex buffers, one per mesh id, uploaded on first sight.
///
/// Geometry is assumed immutable: later edits to a mesh's vertices are not
/// uploaded, and the draw keeps using the vertex count captured at upload.
pub struct VertexManager<B: RenderBackend> {
    entries: BTreeMap<ComponentId, VertexEntry<B>>,
}

impl<B: RenderBackend> Default for VertexManager<B> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<B: RenderBackend> VertexManager<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upload `mesh` if `id` has no buffer yet. Returns false for meshes with
    /// no vertices, which are never uploaded.
    pub fn ensure(&mut self, backend: &B, id: ComponentId, mesh: &MeshComponent) -> bool {
        if self.entries.contains_key(&id) {
            return true;
        }
        let vertex_count = mesh.vertex_count();
        if vertex_count == 0 {
            return false;
        }

        // Zero-pad a trailing partial vertex so the draw never reads past the end.
        let mut data = mesh.vertices().to_vec();
        data.resize(vertex_count as usize * VERTEX_FLOATS, 0.0);

        let buffer = backend.create_buffer(&BufferDesc {
            label: "vertex_buffer",
            size: u64::from(vertex_count) * VERTEX_STRIDE,
            usage: BufferUsage::Vertex,
        });
        backend.write_buffer(&buffer, 0, bytemuck::cast_slice(&data));
        tracing::debug!(mesh = %id, vertex_count, "uploaded vertex buffer");
        self.entries.insert(
            id,
            VertexEntry {
                buffer,
                vertex_count,
            },
        );
        true
    }

    /// Buffer and vertex count captured at upload.
    pub fn get(&self, id: ComponentId) -> Option<(&B::Buffer, u32)> {
        self.entries
            .get(&id)
            .map(|entry| (&entry.buffer, entry.vertex_count))
    }

    pub fn get_vertex_buffer(
        &mut self,
        backend: &B,
        id: ComponentId,
        mesh: &MeshComponent,
    ) -> Option<(&B::Buffer, u32)> {
        if !self.ensure(backend, id, mesh) {
            return None;
        }
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{BackendEvent, HeadlessBackend};
    use crate::layout::decode_f32s;
    use spacekit_ecs::{Bitmap, MaterialConfig, World};

    fn mesh(world: &mut World, vertices: Vec<f32>) -> MeshComponent {
        let material = world.create_material(MaterialConfig::linear(Bitmap::solid(1, 1, [0; 4])));
        MeshComponent::new(vertices, material)
    }

    #[test]
    fn uploads_once_and_ignores_later_edits() {
        let backend = HeadlessBackend::new();
        let mut world = World::new();
        let mut component = mesh(&mut world, vec![1.0; 24]);
        let mut manager = VertexManager::<HeadlessBackend>::new();

        let (first, count) = manager
            .get_vertex_buffer(&backend, ComponentId(0), &component)
            .map(|(b, c)| (*b, c))
            .unwrap();
        assert_eq!(count, 3);

        component.set_vertices(vec![2.0; 48]);
        let (second, count) = manager
            .get_vertex_buffer(&backend, ComponentId(0), &component)
            .map(|(b, c)| (*b, c))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(count, 3);
        assert_eq!(backend.summary().buffers, 1);
        assert_eq!(decode_f32s(&backend.buffer_contents(first).unwrap()), vec![1.0; 24]);
    }

    #[test]
    fn partial_vertex_is_zero_padded() {
        let backend = HeadlessBackend::new();
        let mut world = World::new();
        let component = mesh(&mut world, vec![5.0; 10]);
        let mut manager = VertexManager::<HeadlessBackend>::new();
        assert!(manager.ensure(&backend, ComponentId(1), &component));

        let size = backend.events().iter().find_map(|e| match e {
            BackendEvent::CreateBuffer { size, .. } => Some(*size),
            _ => None,
        });
        assert_eq!(size, Some(64));

        let (buffer, count) = manager.get(ComponentId(1)).unwrap();
        assert_eq!(count, 2);
        let floats = decode_f32s(&backend.buffer_contents(*buffer).unwrap());
        assert_eq!(&floats[8..10], &[5.0, 5.0]);
        assert!(floats[10..].iter().all(|f| *f == 0.0));
    }

    #[test]
    fn empty_mesh_is_never_uploaded() {
        let backend = HeadlessBackend::new();
        let mut world = World::new();
        let component = mesh(&mut world, Vec::new());
        let mut manager = VertexManager::<HeadlessBackend>::new();
        assert!(!manager.ensure(&backend, ComponentId(2), &component));
        assert!(manager.is_empty());
        assert_eq!(backend.summary().buffers, 0);
    }
}
