//! Scene aggregation.
//!
//! A [`Scene`] names one main camera plus ordered lists of light and mesh
//! components. It stores ids only; [`Scene::extract`] resolves them against a
//! [`World`] once per frame into a [`SceneFrame`] of plain world-space values.
//!
//! # Invariants
//! - Lists keep insertion order; draw order follows the mesh list.
//! - The camera is never picked up by [`Scene::add_entity`]; it is set
//!   explicitly.
//! - Extraction without a camera fails with [`SceneError::MissingCamera`].

use glam::{Mat3, Mat4, Vec3};
use spacekit_common::{ComponentId, EntityId, SceneId, Transform};
use spacekit_ecs::{
    DirectionalLightComponent, EcsError, MeshComponent, PointLightComponent, World,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("{0} has no main camera")]
    MissingCamera(SceneId),
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// World-space directional light for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightData {
    pub color: Vec3,
    pub intensity: f32,
    pub rotation: Mat3,
    pub direction: Vec3,
}

/// World-space point light for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightData {
    pub position: Vec3,
    pub intensity: f32,
    pub color: Vec3,
    pub range: f32,
    pub direction: Vec3,
    pub angle: f32,
}

/// Camera and light values resolved for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub directional_lights: Vec<DirectionalLightData>,
    pub point_lights: Vec<PointLightData>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    id: SceneId,
    main_camera: Option<ComponentId>,
    directional_lights: Vec<ComponentId>,
    point_lights: Vec<ComponentId>,
    meshes: Vec<ComponentId>,
}

impl Scene {
    /// Empty scene with an id from `world`.
    pub fn new(world: &mut World) -> Self {
        Self {
            id: world.allocate_scene_id(),
            main_camera: None,
            directional_lights: Vec::new(),
            point_lights: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn main_camera(&self) -> Option<ComponentId> {
        self.main_camera
    }

    pub fn set_main_camera(&mut self, camera: ComponentId) {
        self.main_camera = Some(camera);
    }

    pub fn directional_lights(&self) -> &[ComponentId] {
        &self.directional_lights
    }

    pub fn point_lights(&self) -> &[ComponentId] {
        &self.point_lights
    }

    pub fn meshes(&self) -> &[ComponentId] {
        &self.meshes
    }

    /// Append the first mesh, directional light and point light of `entity`,
    /// whichever it has.
    pub fn add_entity(&mut self, world: &World, entity: EntityId) -> Result<(), SceneError> {
        if world.entity(entity).is_none() {
            return Err(EcsError::EntityNotFound(entity).into());
        }
        if let Some(mesh) = world.find_component::<MeshComponent>(entity) {
            self.meshes.push(mesh);
        }
        if let Some(light) = world.find_component::<DirectionalLightComponent>(entity) {
            self.directional_lights.push(light);
        }
        if let Some(light) = world.find_component::<PointLightComponent>(entity) {
            self.point_lights.push(light);
        }
        tracing::debug!(scene = %self.id, %entity, "added entity to scene");
        Ok(())
    }

    pub fn add_mesh(&mut self, mesh: ComponentId) {
        self.meshes.push(mesh);
    }

    pub fn add_directional_light(&mut self, light: ComponentId) {
        self.directional_lights.push(light);
    }

    pub fn add_point_light(&mut self, light: ComponentId) {
        self.point_lights.push(light);
    }

    /// Resolve camera and lights against the current state of `world`.
    pub fn extract(&self, world: &World) -> Result<SceneFrame, SceneError> {
        let camera = self.main_camera.ok_or(SceneError::MissingCamera(self.id))?;
        let view_projection = world.camera_view_projection(camera)?;
        let camera_position = world
            .component_transform(camera)
            .map(|t| t.position())
            .ok_or(EcsError::Detached(camera))?;

        let directional_lights = self
            .directional_lights
            .iter()
            .map(|&id| {
                let (light, transform) = world.attached::<DirectionalLightComponent>(id)?;
                Ok(DirectionalLightData {
                    color: light.color.truncate(),
                    intensity: light.intensity,
                    rotation: light.rotation_matrix(transform),
                    direction: light.direction(transform),
                })
            })
            .collect::<Result<Vec<_>, EcsError>>()?;

        let point_lights = self
            .point_lights
            .iter()
            .map(|&id| {
                let (light, transform) = world.attached::<PointLightComponent>(id)?;
                Ok(PointLightData {
                    position: light.position(transform),
                    intensity: light.intensity,
                    color: light.color.truncate(),
                    range: light.range,
                    direction: light.direction(transform),
                    angle: light.angle,
                })
            })
            .collect::<Result<Vec<_>, EcsError>>()?;

        Ok(SceneFrame {
            view_projection,
            camera_position,
            directional_lights,
            point_lights,
        })
    }
}

/// Resolve one listed mesh and its owner's transform.
pub fn resolve_mesh(
    world: &World,
    id: ComponentId,
) -> Result<(&MeshComponent, &Transform), SceneError> {
    Ok(world.attached::<MeshComponent>(id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacekit_common::TransformConfig;
    use spacekit_ecs::{
        Bitmap, CameraComponent, CameraConfig, MaterialConfig, PointLightConfig,
    };
    use glam::{Quat, Vec4};
    use std::f32::consts::FRAC_PI_2;

    fn at(position: Vec3) -> TransformConfig {
        TransformConfig {
            position,
            ..Default::default()
        }
    }

    fn mesh(world: &mut World) -> MeshComponent {
        let material = world.create_material(MaterialConfig::linear(Bitmap::solid(1, 1, [255; 4])));
        MeshComponent::new(vec![0.0; 24], material)
    }

    #[test]
    fn add_entity_takes_first_of_each_kind() {
        let mut world = World::new();
        let first = mesh(&mut world);
        let second = mesh(&mut world);
        let entity = world.spawn_with(
            TransformConfig::default(),
            [
                first.into(),
                second.into(),
                PointLightComponent::default().into(),
                CameraComponent::default().into(),
            ],
        );
        let mut scene = Scene::new(&mut world);
        scene.add_entity(&world, entity).unwrap();

        assert_eq!(scene.meshes().len(), 1);
        assert_eq!(scene.point_lights().len(), 1);
        assert!(scene.directional_lights().is_empty());
        assert_eq!(scene.main_camera(), None);
        assert_eq!(
            Some(scene.meshes()[0]),
            world.find_component::<MeshComponent>(entity)
        );
    }

    #[test]
    fn lists_keep_insertion_order() {
        let mut world = World::new();
        let mut scene = Scene::new(&mut world);
        let mut expected = Vec::new();
        for i in 0..3 {
            let m = mesh(&mut world);
            let e = world.spawn_with(at(Vec3::X * i as f32), [m.into()]);
            expected.push(world.find_component::<MeshComponent>(e).unwrap());
            scene.add_entity(&world, e).unwrap();
        }
        assert_eq!(scene.meshes(), expected.as_slice());
    }

    #[test]
    fn extract_without_camera_fails() {
        let mut world = World::new();
        let scene = Scene::new(&mut world);
        assert_eq!(
            scene.extract(&world),
            Err(SceneError::MissingCamera(scene.id()))
        );
    }

    #[test]
    fn extract_resolves_world_space_lights() {
        let mut world = World::new();
        let camera_entity = world.spawn_with(
            at(Vec3::new(0.0, 5.0, 0.0)),
            [CameraComponent::new(CameraConfig {
                far: 800.0,
                ..Default::default()
            })
            .into()],
        );
        let light_entity = world.spawn_with(
            TransformConfig {
                position: Vec3::new(1.0, 2.0, 3.0),
                rotation: Quat::from_rotation_x(-FRAC_PI_2),
                ..Default::default()
            },
            [PointLightComponent::new(PointLightConfig {
                intensity: 2.0,
                color: Vec4::new(0.5, 0.25, 1.0, 1.0),
                range: 30.0,
                angle: 0.5,
            })
            .into()],
        );

        let mut scene = Scene::new(&mut world);
        scene.set_main_camera(world.find_component::<CameraComponent>(camera_entity).unwrap());
        scene.add_entity(&world, light_entity).unwrap();

        let frame = scene.extract(&world).unwrap();
        assert_eq!(frame.camera_position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(frame.point_lights.len(), 1);
        let light = frame.point_lights[0];
        assert_eq!(light.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(light.color, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(light.range, 30.0);
        assert!(light.direction.abs_diff_eq(Vec3::NEG_Y, 1e-6));
    }

    #[test]
    fn extract_reports_detached_light() {
        let mut world = World::new();
        let cam = world.spawn_with(TransformConfig::default(), [CameraComponent::default().into()]);
        let lamp = world.spawn_with(
            TransformConfig::default(),
            [DirectionalLightComponent::default().into()],
        );
        let mut scene = Scene::new(&mut world);
        scene.set_main_camera(world.find_component::<CameraComponent>(cam).unwrap());
        scene.add_entity(&world, lamp).unwrap();
        let light = scene.directional_lights()[0];

        world.despawn(lamp).unwrap();
        assert_eq!(
            scene.extract(&world),
            Err(SceneError::Ecs(EcsError::Detached(light)))
        );
    }

    #[test]
    fn extract_tracks_camera_movement() {
        let mut world = World::new();
        let cam = world.spawn_with(TransformConfig::default(), [CameraComponent::default().into()]);
        let mut scene = Scene::new(&mut world);
        scene.set_main_camera(world.find_component::<CameraComponent>(cam).unwrap());

        let before = scene.extract(&world).unwrap();
        world
            .transform_mut(cam)
            .unwrap()
            .translate(Vec3::new(0.0, 0.0, 1.0), None);
        let after = scene.extract(&world).unwrap();
        assert_eq!(after.camera_position, Vec3::new(0.0, 0.0, -1.0));
        assert_ne!(before.view_projection, after.view_projection);
    }

    #[test]
    fn resolve_mesh_checks_kind() {
        let mut world = World::new();
        let m = mesh(&mut world);
        let e = world.spawn_with(TransformConfig::default(), [m.into()]);
        let id = world.find_component::<MeshComponent>(e).unwrap();
        assert!(resolve_mesh(&world, id).is_ok());

        let cam = world.create_component(CameraComponent::default());
        world.add_component(e, cam).unwrap();
        assert!(matches!(
            resolve_mesh(&world, cam),
            Err(SceneError::Ecs(EcsError::WrongKind { .. }))
        ));
    }
}
