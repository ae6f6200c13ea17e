use crate::bind_groups::{BindGroupsManager, CacheStats};
use crate::layout::{LightLimits, MESH_GROUP, SCENE_GROUP, VERTEX_SLOT};
use crate::vertex::VertexManager;
use crate::{PassCommand, PassDesc, PipelineDesc, RenderBackend, RenderError, ShaderSource};
use serde::{Deserialize, Serialize};
use spacekit_common::{ComponentId, WorldId};
use spacekit_ecs::World;
use spacekit_scene::{Scene, resolve_mesh};

/// Renderer construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub clear_color: [f64; 4],
    pub max_directional_lights: usize,
    pub max_point_lights: usize,
    pub shader_name: String,
    pub width: u32,
    pub height: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 1.0, 1.0, 1.0],
            max_directional_lights: 10,
            max_point_lights: 10,
            shader_name: "base".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl RendererConfig {
    pub fn light_limits(&self) -> LightLimits {
        LightLimits {
            directional: self.max_directional_lights,
            point: self.max_point_lights,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Ready,
    /// Terminal. Every later frame fails with [`RenderError::DeviceLost`].
    DeviceLost,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub draw_calls: u32,
    pub vertices: u64,
    pub skipped_meshes: u32,
    pub directional_lights: u32,
    pub point_lights: u32,
}

struct Draw {
    mesh: ComponentId,
    instance: u32,
}

/// Forward renderer: one pipeline, one depth target, one pass per frame.
///
/// Frames must be serialized; `render` takes `&mut self`.
///
/// Cached resources are keyed by ids that are only unique within one
/// `World`, so a renderer binds to the first world it draws and rejects any
/// other with [`RenderError::ForeignWorld`].
pub struct Renderer<B: RenderBackend> {
    backend: B,
    world: Option<WorldId>,
    config: RendererConfig,
    pipeline: B::Pipeline,
    depth: B::DepthTarget,
    size: (u32, u32),
    pending_resize: Option<(u32, u32)>,
    bind_groups: BindGroupsManager<B>,
    vertices: VertexManager<B>,
    state: RendererState,
    frames: u64,
}

impl<B: RenderBackend> Renderer<B> {
    /// Compile the pipeline and allocate the depth target.
    pub fn create(
        backend: B,
        shaders: &dyn ShaderSource,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let source = shaders.load_shader(&config.shader_name)?;
        let pipeline = backend.create_pipeline(&PipelineDesc {
            label: &config.shader_name,
            source: &source,
        })?;
        let size = (config.width.max(1), config.height.max(1));
        let depth = backend.create_depth_target(size.0, size.1);
        tracing::debug!(shader = %config.shader_name, width = size.0, height = size.1, "renderer ready");

        Ok(Self {
            world: None,
            bind_groups: BindGroupsManager::new(config.light_limits()),
            vertices: VertexManager::new(),
            backend,
            config,
            pipeline,
            depth,
            size,
            pending_resize: None,
            state: RendererState::Ready,
            frames: 0,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Size of the current depth target.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.bind_groups.stats()
    }

    /// The world this renderer is bound to, once it has drawn one.
    pub fn world(&self) -> Option<WorldId> {
        self.world
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Queue a depth-target resize for the next frame boundary. Zero-sized
    /// requests (minimized windows) are ignored.
    pub fn on_screen_resized(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.pending_resize = Some((width, height));
    }

    /// Render one frame of `scene`.
    pub fn render(&mut self, world: &World, scene: &Scene) -> Result<FrameStats, RenderError> {
        if self.state == RendererState::DeviceLost {
            return Err(RenderError::DeviceLost);
        }
        let result = self.render_frame(world, scene);
        if matches!(result, Err(RenderError::DeviceLost)) {
            self.state = RendererState::DeviceLost;
            tracing::error!("graphics device lost; renderer halted");
        }
        result
    }

    fn render_frame(&mut self, world: &World, scene: &Scene) -> Result<FrameStats, RenderError> {
        if self.backend.is_device_lost() {
            return Err(RenderError::DeviceLost);
        }
        self.bind_world(world.id())?;
        self.apply_pending_resize();

        let frame = scene.extract(world)?;
        self.bind_groups
            .ensure_scene(&self.backend, &self.pipeline, scene.id());
        self.bind_groups
            .update_scene(&self.backend, scene.id(), &frame)?;

        let mut stats = FrameStats {
            frame: self.frames,
            directional_lights: frame.directional_lights.len() as u32,
            point_lights: frame.point_lights.len() as u32,
            ..Default::default()
        };

        let mut draws = Vec::with_capacity(scene.meshes().len());
        for (instance, &id) in scene.meshes().iter().enumerate() {
            let (mesh, transform) = resolve_mesh(world, id)?;
            if !self.vertices.ensure(&self.backend, id, mesh) {
                stats.skipped_meshes += 1;
                continue;
            }
            self.bind_groups
                .ensure_mesh(&self.backend, &self.pipeline, id, mesh);
            self.bind_groups.update_mesh(&self.backend, id, transform)?;
            draws.push(Draw {
                mesh: id,
                instance: instance as u32,
            });
        }

        let target = self.backend.acquire_target()?;

        let scene_group = self
            .bind_groups
            .scene_bind_group(scene.id())
            .ok_or_else(|| RenderError::NotEnsured(scene.id().to_string()))?;
        let mut commands = Vec::with_capacity(1 + draws.len() * 3);
        commands.push(PassCommand::SetBindGroup {
            index: SCENE_GROUP,
            bind_group: scene_group,
        });
        for draw in &draws {
            let mesh_group = self
                .bind_groups
                .mesh_bind_group(draw.mesh)
                .ok_or_else(|| RenderError::NotEnsured(draw.mesh.to_string()))?;
            let (buffer, vertex_count) = self
                .vertices
                .get(draw.mesh)
                .ok_or_else(|| RenderError::NotEnsured(draw.mesh.to_string()))?;
            commands.push(PassCommand::SetBindGroup {
                index: MESH_GROUP,
                bind_group: mesh_group,
            });
            commands.push(PassCommand::SetVertexBuffer {
                slot: VERTEX_SLOT,
                buffer,
            });
            commands.push(PassCommand::Draw {
                vertex_count,
                instance: draw.instance,
            });
            stats.draw_calls += 1;
            stats.vertices += u64::from(vertex_count);
        }

        self.backend.submit_pass(&PassDesc {
            target: &target,
            depth: &self.depth,
            pipeline: &self.pipeline,
            clear_color: self.config.clear_color,
            commands: &commands,
        });
        self.backend.present(target);

        self.frames += 1;
        Ok(stats)
    }

    fn bind_world(&mut self, world: WorldId) -> Result<(), RenderError> {
        match self.world {
            Some(bound) if bound != world => Err(RenderError::ForeignWorld {
                bound,
                found: world,
            }),
            Some(_) => Ok(()),
            None => {
                tracing::debug!(%world, "renderer bound to world");
                self.world = Some(world);
                Ok(())
            }
        }
    }

    fn apply_pending_resize(&mut self) {
        let Some((width, height)) = self.pending_resize.take() else {
            return;
        };
        if (width, height) == self.size {
            return;
        }
        self.depth = self.backend.create_depth_target(width, height);
        self.size = (width, height);
        tracing::debug!(width, height, "recreated depth target");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{BackendEvent, HeadlessBackend, RecordedCommand};
    use crate::layout::decode_f32s;
    use glam::{Mat4, Vec3};
    use spacekit_common::TransformConfig;
    use spacekit_ecs::{
        Bitmap, CameraComponent, CameraConfig, DirectionalLightComponent, MaterialConfig,
        MeshComponent, PointLightComponent,
    };
    use spacekit_scene::SceneError;
    use std::collections::BTreeMap;

    fn shaders() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(
            "base".to_string(),
            "@vertex fn vs_main() {} @fragment fn fs_main() {}".to_string(),
        );
        map
    }

    fn renderer() -> Renderer<HeadlessBackend> {
        Renderer::create(HeadlessBackend::new(), &shaders(), RendererConfig::default()).unwrap()
    }

    fn add_mesh(world: &mut World, scene: &mut Scene, config: TransformConfig, floats: usize) {
        let material = world.create_material(MaterialConfig::linear(Bitmap::solid(4, 4, [200; 4])));
        let entity = world.spawn_with(config, [MeshComponent::new(vec![0.5; floats], material).into()]);
        scene.add_entity(world, entity).unwrap();
    }

    /// Camera at (0,5,0), far=800, and one mesh at the origin.
    fn basic_scene() -> (World, Scene) {
        let mut world = World::new();
        let camera = world.spawn_with(
            TransformConfig {
                position: Vec3::new(0.0, 5.0, 0.0),
                ..Default::default()
            },
            [CameraComponent::new(CameraConfig {
                far: 800.0,
                ..Default::default()
            })
            .into()],
        );
        let mut scene = Scene::new(&mut world);
        scene.set_main_camera(world.find_component::<CameraComponent>(camera).unwrap());
        add_mesh(&mut world, &mut scene, TransformConfig::default(), 36 * 8);
        (world, scene)
    }

    fn mesh_uniform_handles(backend: &HeadlessBackend) -> Vec<crate::headless::Handle> {
        backend
            .events()
            .iter()
            .filter_map(|e| match e {
                BackendEvent::CreateBuffer { handle, label, .. } if label == "mesh_uniform" => {
                    Some(*handle)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_mesh_scene_issues_one_draw_with_identity_transform() {
        let (world, scene) = basic_scene();
        let mut renderer = renderer();

        let stats = renderer.render(&world, &scene).unwrap();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(renderer.backend().last_pass_draws(), vec![(36, 0)]);

        let uniform = mesh_uniform_handles(renderer.backend())[0];
        let floats = decode_f32s(&renderer.backend().buffer_contents(uniform).unwrap());
        assert_eq!(&floats[..16], &Mat4::IDENTITY.to_cols_array());
    }

    #[test]
    fn pass_clears_white_and_binds_scene_once() {
        let (mut world, mut scene) = basic_scene();
        add_mesh(&mut world, &mut scene, TransformConfig::default(), 24);
        let mut renderer = renderer();
        renderer.render(&world, &scene).unwrap();

        let events = renderer.backend().events();
        let (clear, commands) = events
            .iter()
            .find_map(|e| match e {
                BackendEvent::SubmitPass {
                    clear_color,
                    commands,
                    ..
                } => Some((*clear_color, commands.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(clear, [1.0, 1.0, 1.0, 1.0]);
        let scene_binds = commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::SetBindGroup { index: 0, .. }))
            .count();
        assert_eq!(scene_binds, 1);
        assert!(matches!(commands[0], RecordedCommand::SetBindGroup { index: 0, .. }));
        assert!(matches!(events.last(), Some(BackendEvent::Present { .. })));
    }

    #[test]
    fn instance_index_follows_mesh_list_position() {
        let (mut world, mut scene) = basic_scene();
        add_mesh(&mut world, &mut scene, TransformConfig::default(), 0);
        add_mesh(&mut world, &mut scene, TransformConfig::default(), 16);
        let mut renderer = renderer();

        let stats = renderer.render(&world, &scene).unwrap();
        assert_eq!(stats.skipped_meshes, 1);
        assert_eq!(renderer.backend().last_pass_draws(), vec![(36, 0), (2, 2)]);
    }

    #[test]
    fn second_frame_reuses_resources_and_tracks_movement() {
        let (mut world, scene) = basic_scene();
        let mut renderer = renderer();
        renderer.render(&world, &scene).unwrap();
        let after_first = renderer.backend().summary();

        let mesh = scene.meshes()[0];
        let owner = world.owner(mesh).unwrap();
        world
            .transform_mut(owner)
            .unwrap()
            .set_position(Vec3::new(2.0, 0.0, 0.0));
        let stats = renderer.render(&world, &scene).unwrap();
        assert_eq!(stats.frame, 1);

        let after_second = renderer.backend().summary();
        assert_eq!(after_second.buffers, after_first.buffers);
        assert_eq!(after_second.bind_groups, after_first.bind_groups);
        assert_eq!(after_second.textures, 1);
        assert_eq!(after_second.passes, 2);

        let uniform = mesh_uniform_handles(renderer.backend())[0];
        let floats = decode_f32s(&renderer.backend().buffer_contents(uniform).unwrap());
        assert_eq!(&floats[12..15], &[2.0, 0.0, 0.0]);
        assert_eq!(
            renderer.cache_stats(),
            CacheStats {
                scene_entries: 1,
                mesh_entries: 1,
                texture_entries: 1
            }
        );
    }

    #[test]
    fn second_world_is_rejected_instead_of_aliasing_cached_meshes() {
        let (world_a, scene_a) = basic_scene();
        let mut world_b = World::new();
        let camera = world_b.spawn_with(TransformConfig::default(), [CameraComponent::default().into()]);
        let mut scene_b = Scene::new(&mut world_b);
        scene_b.set_main_camera(world_b.find_component::<CameraComponent>(camera).unwrap());
        add_mesh(&mut world_b, &mut scene_b, TransformConfig::default(), 3 * 8);
        // Both worlds hand out the same raw ids.
        assert_eq!(scene_a.meshes(), scene_b.meshes());

        let mut renderer = renderer();
        renderer.render(&world_a, &scene_a).unwrap();
        assert_eq!(renderer.world(), Some(world_a.id()));
        let before = renderer.backend().summary();

        let err = renderer.render(&world_b, &scene_b).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ForeignWorld { bound, found }
                if bound == world_a.id() && found == world_b.id()
        ));
        assert!(!err.is_fatal());
        assert_eq!(renderer.backend().summary(), before);
        assert_eq!(renderer.backend().last_pass_draws(), vec![(36, 0)]);

        renderer.render(&world_a, &scene_a).unwrap();
        assert_eq!(renderer.backend().summary().passes, 2);
    }

    #[test]
    fn missing_camera_is_a_skippable_error() {
        let mut world = World::new();
        let mut scene = Scene::new(&mut world);
        add_mesh(&mut world, &mut scene, TransformConfig::default(), 24);
        let mut renderer = renderer();

        let err = renderer.render(&world, &scene).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Scene(SceneError::MissingCamera(id)) if id == scene.id()
        ));
        assert!(!err.is_fatal());
        assert_eq!(renderer.state(), RendererState::Ready);
        assert_eq!(renderer.backend().summary().passes, 0);
    }

    #[test]
    fn empty_scene_still_clears() {
        let mut world = World::new();
        let camera = world.spawn_with(TransformConfig::default(), [CameraComponent::default().into()]);
        let mut scene = Scene::new(&mut world);
        scene.set_main_camera(world.find_component::<CameraComponent>(camera).unwrap());
        let mut renderer = renderer();

        let stats = renderer.render(&world, &scene).unwrap();
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(renderer.backend().summary().passes, 1);
    }

    #[test]
    fn too_many_lights_fails_the_frame() {
        let (mut world, mut scene) = basic_scene();
        for _ in 0..11 {
            let e = world.spawn_with(
                TransformConfig::default(),
                [PointLightComponent::default().into()],
            );
            scene.add_entity(&world, e).unwrap();
        }
        let mut renderer = renderer();
        let err = renderer.render(&world, &scene).unwrap_err();
        assert!(matches!(
            err,
            RenderError::LightCapacityExceeded { count: 11, capacity: 10, .. }
        ));
        assert_eq!(renderer.backend().summary().passes, 0);
    }

    #[test]
    fn lights_reach_the_storage_buffers() {
        let (mut world, mut scene) = basic_scene();
        let lamp = world.spawn_with(
            TransformConfig::default(),
            [
                DirectionalLightComponent::default().into(),
                PointLightComponent::default().into(),
            ],
        );
        scene.add_entity(&world, lamp).unwrap();
        let mut renderer = renderer();
        let stats = renderer.render(&world, &scene).unwrap();
        assert_eq!((stats.directional_lights, stats.point_lights), (1, 1));

        let backend = renderer.backend();
        let point_buffer = backend
            .events()
            .iter()
            .find_map(|e| match e {
                BackendEvent::CreateBuffer { handle, label, .. } if label == "point_lights" => {
                    Some(*handle)
                }
                _ => None,
            })
            .unwrap();
        let floats = decode_f32s(&backend.buffer_contents(point_buffer).unwrap());
        assert_eq!(floats[3], 1.0);
        assert_eq!(floats[7], 100.0);
        assert_eq!(floats[11], std::f32::consts::PI);
    }

    #[test]
    fn device_loss_is_terminal() {
        let (world, scene) = basic_scene();
        let mut renderer = renderer();
        renderer.render(&world, &scene).unwrap();

        renderer.backend().simulate_device_loss();
        let err = renderer.render(&world, &scene).unwrap_err();
        assert!(matches!(err, RenderError::DeviceLost));
        assert!(err.is_fatal());
        assert_eq!(renderer.state(), RendererState::DeviceLost);
        assert!(matches!(
            renderer.render(&world, &scene),
            Err(RenderError::DeviceLost)
        ));
        assert_eq!(renderer.backend().summary().passes, 1);
    }

    #[test]
    fn failed_acquire_skips_only_that_frame() {
        let (world, scene) = basic_scene();
        let mut renderer = renderer();
        renderer.backend().fail_next_acquire();

        let err = renderer.render(&world, &scene).unwrap_err();
        assert!(!err.is_fatal());
        assert!(renderer.render(&world, &scene).is_ok());
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn resize_is_applied_at_the_next_frame() {
        let (world, scene) = basic_scene();
        let mut renderer = renderer();
        renderer.on_screen_resized(1024, 768);
        assert_eq!(renderer.size(), (800, 600));
        assert_eq!(renderer.backend().summary().depth_targets, 1);

        renderer.on_screen_resized(0, 0);
        renderer.render(&world, &scene).unwrap();
        assert_eq!(renderer.size(), (1024, 768));

        let backend = renderer.backend();
        assert_eq!(backend.summary().depth_targets, 2);
        let events = backend.events();
        let new_depth = events
            .iter()
            .rev()
            .find_map(|e| match e {
                BackendEvent::CreateDepthTarget { handle, width: 1024, height: 768 } => Some(*handle),
                _ => None,
            })
            .unwrap();
        let used_depth = events
            .iter()
            .find_map(|e| match e {
                BackendEvent::SubmitPass { depth, .. } => Some(*depth),
                _ => None,
            })
            .unwrap();
        assert_eq!(new_depth, used_depth);
    }

    #[test]
    fn missing_shader_fails_creation() {
        let config = RendererConfig {
            shader_name: "toon".into(),
            ..Default::default()
        };
        let result = Renderer::create(HeadlessBackend::new(), &shaders(), config);
        assert!(matches!(result, Err(RenderError::Shader(_))));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RendererConfig = serde_json::from_str(r#"{"max_point_lights": 4}"#).unwrap();
        assert_eq!(config.max_point_lights, 4);
        assert_eq!(config.max_directional_lights, 10);
        assert_eq!(config.clear_color, [1.0; 4]);
        assert_eq!(config.shader_name, "base");
    }
}
