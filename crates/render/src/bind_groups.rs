//! Identity-keyed cache of per-scene and per-mesh GPU resources.
//!
//! Two-phase contract: `ensure_*` is idempotent and may allocate; `update_*`
//! allocates nothing and rewrites contents unconditionally. Call both every
//! frame, ensure first.
//!
//! # Invariants
//! - At most one resource set per `SceneId` and per mesh `ComponentId`.
//! - At most one texture and sampler per `MaterialId`; textures are never
//!   rewritten.
//! - Light capacity is checked before any scene buffer is written.
//! - Entries are never evicted.

use crate::layout::{
    self, LightLimits, MeshUniform, SceneUniform, MESH_GROUP, MESH_UNIFORM_SIZE, SCENE_GROUP,
    SCENE_UNIFORM_SIZE,
};
use crate::{BindingResource, BufferDesc, BufferUsage, RenderBackend, RenderError};
use spacekit_common::{ComponentId, MaterialId, SceneId, Transform};
use spacekit_ecs::{Material, MeshComponent};
use spacekit_scene::SceneFrame;
use std::collections::BTreeMap;

struct SceneResources<B: RenderBackend> {
    uniform: B::Buffer,
    directional: B::Buffer,
    point: B::Buffer,
    bind_group: B::BindGroup,
}

struct MeshResources<B: RenderBackend> {
    uniform: B::Buffer,
    bind_group: B::BindGroup,
}

struct MaterialResources<B: RenderBackend> {
    texture: B::Texture,
    sampler: B::Sampler,
}

/// Entry counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub scene_entries: usize,
    pub mesh_entries: usize,
    pub texture_entries: usize,
}

pub struct BindGroupsManager<B: RenderBackend> {
    limits: LightLimits,
    scenes: BTreeMap<SceneId, SceneResources<B>>,
    meshes: BTreeMap<ComponentId, MeshResources<B>>,
    materials: BTreeMap<MaterialId, MaterialResources<B>>,
}

impl<B: RenderBackend> BindGroupsManager<B> {
    pub fn new(limits: LightLimits) -> Self {
        Self {
            limits,
            scenes: BTreeMap::new(),
            meshes: BTreeMap::new(),
            materials: BTreeMap::new(),
        }
    }

    pub fn limits(&self) -> LightLimits {
        self.limits
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            scene_entries: self.scenes.len(),
            mesh_entries: self.meshes.len(),
            texture_entries: self.materials.len(),
        }
    }

    /// Allocate the scene uniform, both light buffers and their bind group
    /// the first time `scene` is seen.
    pub fn ensure_scene(&mut self, backend: &B, pipeline: &B::Pipeline, scene: SceneId) {
        if self.scenes.contains_key(&scene) {
            return;
        }
        let uniform = backend.create_buffer(&BufferDesc {
            label: "scene_uniform",
            size: SCENE_UNIFORM_SIZE,
            usage: BufferUsage::Uniform,
        });
        let directional = backend.create_buffer(&BufferDesc {
            label: "directional_lights",
            size: self.limits.directional_bytes(),
            usage: BufferUsage::Storage,
        });
        let point = backend.create_buffer(&BufferDesc {
            label: "point_lights",
            size: self.limits.point_bytes(),
            usage: BufferUsage::Storage,
        });
        let bind_group = backend.create_bind_group(
            "scene_bind_group",
            pipeline,
            SCENE_GROUP,
            &[
                BindingResource::Buffer(&uniform),
                BindingResource::Buffer(&directional),
                BindingResource::Buffer(&point),
            ],
        );
        tracing::debug!(%scene, "allocated scene resources");
        self.scenes.insert(
            scene,
            SceneResources {
                uniform,
                directional,
                point,
                bind_group,
            },
        );
    }

    /// Upload camera and light data for this frame.
    pub fn update_scene(
        &self,
        backend: &B,
        scene: SceneId,
        frame: &SceneFrame,
    ) -> Result<(), RenderError> {
        self.limits.check(frame)?;
        let resources = self
            .scenes
            .get(&scene)
            .ok_or_else(|| RenderError::NotEnsured(scene.to_string()))?;

        let uniform = SceneUniform::from_frame(frame);
        backend.write_buffer(&resources.uniform, 0, bytemuck::bytes_of(&uniform));

        let directional = layout::pack_directional_lights(&frame.directional_lights);
        if !directional.is_empty() {
            backend.write_buffer(&resources.directional, 0, bytemuck::cast_slice(&directional));
        }
        let point = layout::pack_point_lights(&frame.point_lights);
        if !point.is_empty() {
            backend.write_buffer(&resources.point, 0, bytemuck::cast_slice(&point));
        }
        Ok(())
    }

    pub fn scene_bind_group(&self, scene: SceneId) -> Option<&B::BindGroup> {
        self.scenes.get(&scene).map(|r| &r.bind_group)
    }

    /// Ensure, update and return the scene bind group.
    pub fn get_scene_bind_group(
        &mut self,
        backend: &B,
        pipeline: &B::Pipeline,
        scene: SceneId,
        frame: &SceneFrame,
    ) -> Result<&B::BindGroup, RenderError> {
        self.ensure_scene(backend, pipeline, scene);
        self.update_scene(backend, scene, frame)?;
        self.scene_bind_group(scene)
            .ok_or_else(|| RenderError::NotEnsured(scene.to_string()))
    }

    /// Allocate the mesh uniform and bind group the first time `id` is seen,
    /// reusing the texture and sampler of its material when already resident.
    pub fn ensure_mesh(
        &mut self,
        backend: &B,
        pipeline: &B::Pipeline,
        id: ComponentId,
        mesh: &MeshComponent,
    ) {
        if self.meshes.contains_key(&id) {
            return;
        }
        let material = self.ensure_material(backend, mesh.material());
        let uniform = backend.create_buffer(&BufferDesc {
            label: "mesh_uniform",
            size: MESH_UNIFORM_SIZE,
            usage: BufferUsage::Uniform,
        });
        let bind_group = backend.create_bind_group(
            "mesh_bind_group",
            pipeline,
            MESH_GROUP,
            &[
                BindingResource::Buffer(&uniform),
                BindingResource::Sampler(&material.sampler),
                BindingResource::Texture(&material.texture),
            ],
        );
        tracing::debug!(mesh = %id, material = %mesh.material().id(), "allocated mesh resources");
        self.meshes.insert(id, MeshResources { uniform, bind_group });
    }

    /// Upload the owner's world and normal matrices.
    pub fn update_mesh(
        &self,
        backend: &B,
        id: ComponentId,
        transform: &Transform,
    ) -> Result<(), RenderError> {
        let resources = self
            .meshes
            .get(&id)
            .ok_or_else(|| RenderError::NotEnsured(id.to_string()))?;
        let uniform = MeshUniform::from_transform(transform);
        backend.write_buffer(&resources.uniform, 0, bytemuck::bytes_of(&uniform));
        Ok(())
    }

    pub fn mesh_bind_group(&self, id: ComponentId) -> Option<&B::BindGroup> {
        self.meshes.get(&id).map(|r| &r.bind_group)
    }

    /// Ensure, update and return the mesh bind group.
    pub fn get_mesh_bind_group(
        &mut self,
        backend: &B,
        pipeline: &B::Pipeline,
        id: ComponentId,
        mesh: &MeshComponent,
        transform: &Transform,
    ) -> Result<&B::BindGroup, RenderError> {
        self.ensure_mesh(backend, pipeline, id, mesh);
        self.update_mesh(backend, id, transform)?;
        self.mesh_bind_group(id)
            .ok_or_else(|| RenderError::NotEnsured(id.to_string()))
    }

    fn ensure_material(&mut self, backend: &B, material: &Material) -> &MaterialResources<B> {
        self.materials.entry(material.id()).or_insert_with(|| {
            tracing::debug!(
                material = %material.id(),
                width = material.texture().width(),
                height = material.texture().height(),
                "uploading material texture"
            );
            MaterialResources {
                texture: backend.create_texture("material_texture", material.texture()),
                sampler: backend.create_sampler(material.min_filter(), material.mag_filter()),
            }
        })
    }
}
