//! Built-in demo scene shared by the desktop viewer and the CLI.

use crate::primitives::cube_vertices;
use glam::{EulerRot, Quat, Vec3, Vec4};
use spacekit_common::{ComponentId, EntityId, TransformConfig};
use spacekit_ecs::{
    Bitmap, CameraComponent, CameraConfig, ComponentKind, DirectionalLightComponent,
    DirectionalLightConfig, EcsError, MaterialConfig, MeshComponent, PointLightComponent,
    PointLightConfig, World,
};
use spacekit_scene::{Scene, SceneError};
use std::f32::consts::PI;

pub const MODEL_POSITION: Vec3 = Vec3::new(40.0, 0.0, -100.0);

/// Handles into a scene built by [`build_demo_scene`].
#[derive(Debug)]
pub struct DemoScene {
    pub scene: Scene,
    pub camera_entity: EntityId,
    pub camera: ComponentId,
    pub floor: EntityId,
    pub model: Option<EntityId>,
}

/// Camera, chess floor, optional model, one directional and two point
/// lights.
///
/// `camera.far` is raised to at least 800 so the floor's far edge stays
/// inside the frustum.
pub fn build_demo_scene(
    world: &mut World,
    mut camera: CameraConfig,
    model: Option<MeshComponent>,
) -> Result<DemoScene, SceneError> {
    camera.far = camera.far.max(800.0);
    let mut scene = Scene::new(world);

    let camera_entity = world.spawn_with(
        TransformConfig {
            position: Vec3::new(40.0, 20.0, 0.0),
            ..Default::default()
        },
        [CameraComponent::new(camera).into()],
    );
    let camera_id = world
        .find_component::<CameraComponent>(camera_entity)
        .ok_or(EcsError::MissingComponent {
            entity: camera_entity,
            kind: ComponentKind::Camera,
        })?;
    scene.set_main_camera(camera_id);

    let chess = Bitmap::checkerboard(256, 8, [255, 255, 255, 255], [30, 30, 30, 255]);
    let material = world.create_material(MaterialConfig::linear(chess));
    let floor = world.spawn_with(
        TransformConfig {
            position: Vec3::new(0.0, -10.0, -40.0),
            scale: Vec3::new(200.0, 1.0, 200.0),
            ..Default::default()
        },
        [MeshComponent::new(cube_vertices(), material).into()],
    );
    scene.add_entity(world, floor)?;

    let model = match model {
        Some(mesh) => {
            let entity = world.spawn_with(
                TransformConfig {
                    position: MODEL_POSITION,
                    ..Default::default()
                },
                [mesh.into()],
            );
            scene.add_entity(world, entity)?;
            Some(entity)
        }
        None => None,
    };

    let sun = world.spawn_with(
        TransformConfig {
            rotation: Quat::from_euler(EulerRot::YXZ, PI, 30f32.to_radians(), 0.0),
            ..Default::default()
        },
        [DirectionalLightComponent::new(DirectionalLightConfig {
            intensity: 0.7,
            color: Vec4::ONE,
        })
        .into()],
    );
    scene.add_entity(world, sun)?;

    let lamps = [
        (Vec3::new(5.0, 10.0, -40.0), 150.0, Vec4::new(0.0, 0.0, 1.0, 1.0), 15f32),
        (Vec3::new(65.0, 10.0, -40.0), 300.0, Vec4::new(1.0, 0.0, 0.0, 1.0), 160f32),
    ];
    for (position, range, color, angle_deg) in lamps {
        let lamp = world.spawn_with(
            TransformConfig {
                position,
                ..Default::default()
            },
            [PointLightComponent::new(PointLightConfig {
                intensity: 1.2,
                color,
                range,
                angle: angle_deg.to_radians(),
            })
            .into()],
        );
        scene.add_entity(world, lamp)?;
    }

    tracing::info!(
        scene = %scene.id(),
        meshes = scene.meshes().len(),
        entities = world.entity_count(),
        "built demo scene"
    );

    Ok(DemoScene {
        scene,
        camera_entity,
        camera: camera_id,
        floor,
        model,
    })
}
