//! GPU memory layout of everything the renderer uploads.
//!
//! All structs are `#[repr(C)]` + `Pod` and mirror the WGSL declarations of
//! the forward shader byte for byte (std140/std430 alignment rules).
//!
//! # Layout
//! - Group 0 (per scene): binding 0 [`SceneUniform`], binding 1 array of
//!   [`GpuDirectionalLight`] (storage, read-only), binding 2 array of
//!   [`GpuPointLight`] (storage, read-only).
//! - Group 1 (per mesh): binding 0 [`MeshUniform`], binding 1 sampler,
//!   binding 2 texture.
//! - Vertex slot 0: 32-byte stride, position `Float32x3` @0, uv
//!   `Float32x2` @12, normal `Float32x3` @20.

use crate::RenderError;
use bytemuck::{Pod, Zeroable};
use glam::Mat3;
use serde::{Deserialize, Serialize};
use spacekit_common::Transform;
use spacekit_scene::{DirectionalLightData, PointLightData, SceneFrame};
use std::fmt;

pub const SCENE_GROUP: u32 = 0;
pub const MESH_GROUP: u32 = 1;
pub const VERTEX_SLOT: u32 = 0;

pub const SCENE_UNIFORM_SIZE: u64 = std::mem::size_of::<SceneUniform>() as u64;
pub const MESH_UNIFORM_SIZE: u64 = std::mem::size_of::<MeshUniform>() as u64;
pub const DIRECTIONAL_LIGHT_STRIDE: u64 = std::mem::size_of::<GpuDirectionalLight>() as u64;
pub const POINT_LIGHT_STRIDE: u64 = std::mem::size_of::<GpuPointLight>() as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point,
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Directional => "directional",
            Self::Point => "point",
        })
    }
}

/// Fixed light-buffer capacities of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightLimits {
    pub directional: usize,
    pub point: usize,
}

impl Default for LightLimits {
    fn default() -> Self {
        Self {
            directional: 10,
            point: 10,
        }
    }
}

impl LightLimits {
    /// Fails before anything is written when `frame` holds more lights than
    /// the buffers can take.
    pub fn check(&self, frame: &SceneFrame) -> Result<(), RenderError> {
        check_capacity(LightKind::Directional, frame.directional_lights.len(), self.directional)?;
        check_capacity(LightKind::Point, frame.point_lights.len(), self.point)
    }

    pub fn directional_bytes(&self) -> u64 {
        self.directional.max(1) as u64 * DIRECTIONAL_LIGHT_STRIDE
    }

    pub fn point_bytes(&self) -> u64 {
        self.point.max(1) as u64 * POINT_LIGHT_STRIDE
    }
}

fn check_capacity(kind: LightKind, count: usize, capacity: usize) -> Result<(), RenderError> {
    if count > capacity {
        return Err(RenderError::LightCapacityExceeded {
            kind,
            count,
            capacity,
        });
    }
    Ok(())
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub directional_count: u32,
    pub point_count: u32,
    pub _pad: [u32; 3],
}

impl SceneUniform {
    pub fn from_frame(frame: &SceneFrame) -> Self {
        Self {
            view_proj: frame.view_projection.to_cols_array_2d(),
            camera_position: frame.camera_position.to_array(),
            directional_count: frame.directional_lights.len() as u32,
            point_count: frame.point_lights.len() as u32,
            _pad: [0; 3],
        }
    }
}

/// Color, intensity and a 3x4 (column-padded) rotation matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub rotation: [[f32; 4]; 3],
}

impl From<&DirectionalLightData> for GpuDirectionalLight {
    fn from(light: &DirectionalLightData) -> Self {
        Self {
            color: light.color.to_array(),
            intensity: light.intensity,
            rotation: padded_mat3(light.rotation),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub range: f32,
    pub direction: [f32; 3],
    pub angle: f32,
}

impl From<&PointLightData> for GpuPointLight {
    fn from(light: &PointLightData) -> Self {
        Self {
            position: light.position.to_array(),
            intensity: light.intensity,
            color: light.color.to_array(),
            range: light.range,
            direction: light.direction.to_array(),
            angle: light.angle,
        }
    }
}

/// World matrix plus the rotation-only normal matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl MeshUniform {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model: transform.matrix().to_cols_array_2d(),
            normal: padded_mat3(transform.normal_matrix()),
        }
    }
}

pub fn pack_directional_lights(lights: &[DirectionalLightData]) -> Vec<GpuDirectionalLight> {
    lights.iter().map(GpuDirectionalLight::from).collect()
}

pub fn pack_point_lights(lights: &[PointLightData]) -> Vec<GpuPointLight> {
    lights.iter().map(GpuPointLight::from).collect()
}

fn padded_mat3(m: Mat3) -> [[f32; 4]; 3] {
    let c = m.to_cols_array_2d();
    [
        [c[0][0], c[0][1], c[0][2], 0.0],
        [c[1][0], c[1][1], c[1][2], 0.0],
        [c[2][0], c[2][1], c[2][2], 0.0],
    ]
}

/// Reinterpret little-endian bytes as floats.
pub fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn sizes_match_shader_structs() {
        assert_eq!(SCENE_UNIFORM_SIZE, 96);
        assert_eq!(DIRECTIONAL_LIGHT_STRIDE, 64);
        assert_eq!(POINT_LIGHT_STRIDE, 48);
        assert_eq!(MESH_UNIFORM_SIZE, 112);
    }

    fn sample_frame() -> SceneFrame {
        let directional = (0..10)
            .map(|i| DirectionalLightData {
                color: Vec3::new(i as f32, 0.5, 0.25),
                intensity: 1.0 + i as f32,
                rotation: Mat3::from_quat(Quat::from_rotation_y(0.1 * i as f32)),
                direction: Vec3::NEG_Z,
            })
            .collect();
        let point = (0..10)
            .map(|i| PointLightData {
                position: Vec3::new(i as f32, 2.0, -3.0),
                intensity: 0.5 * i as f32,
                color: Vec3::new(255.0, 128.0, i as f32),
                range: 10.0 * (i + 1) as f32,
                direction: Vec3::new(0.0, -1.0, 0.0),
                angle: 0.1 * i as f32,
            })
            .collect();
        SceneFrame {
            view_projection: Mat4::IDENTITY,
            camera_position: Vec3::new(0.0, 5.0, 0.0),
            directional_lights: directional,
            point_lights: point,
        }
    }

    #[test]
    fn directional_lights_decode_at_documented_offsets() {
        let frame = sample_frame();
        let packed = pack_directional_lights(&frame.directional_lights);
        let floats = decode_f32s(bytemuck::cast_slice(&packed));
        assert_eq!(floats.len(), 10 * 16);

        for (i, light) in frame.directional_lights.iter().enumerate() {
            let f = &floats[i * 16..(i + 1) * 16];
            assert_eq!(&f[0..3], &light.color.to_array());
            assert_eq!(f[3], light.intensity);
            let cols = light.rotation.to_cols_array_2d();
            for col in 0..3 {
                assert_eq!(&f[4 + col * 4..4 + col * 4 + 3], &cols[col]);
                assert_eq!(f[4 + col * 4 + 3], 0.0);
            }
        }
    }

    #[test]
    fn point_lights_decode_at_documented_offsets() {
        let frame = sample_frame();
        let packed = pack_point_lights(&frame.point_lights);
        let floats = decode_f32s(bytemuck::cast_slice(&packed));
        assert_eq!(floats.len(), 10 * 12);

        for (i, light) in frame.point_lights.iter().enumerate() {
            let f = &floats[i * 12..(i + 1) * 12];
            assert_eq!(&f[0..3], &light.position.to_array());
            assert_eq!(f[3], light.intensity);
            assert_eq!(&f[4..7], &light.color.to_array());
            assert_eq!(f[7], light.range);
            assert_eq!(&f[8..11], &light.direction.to_array());
            assert_eq!(f[11], light.angle);
        }
    }

    #[test]
    fn scene_uniform_carries_counts() {
        let frame = sample_frame();
        let uniform = SceneUniform::from_frame(&frame);
        let bytes = bytemuck::bytes_of(&uniform);
        let floats = decode_f32s(&bytes[64..76]);
        assert_eq!(floats, vec![0.0, 5.0, 0.0]);
        assert_eq!(uniform.directional_count, 10);
        assert_eq!(uniform.point_count, 10);
    }

    #[test]
    fn capacity_is_checked_per_kind() {
        let mut frame = sample_frame();
        let limits = LightLimits::default();
        assert!(limits.check(&frame).is_ok());

        frame.point_lights.push(frame.point_lights[0]);
        match limits.check(&frame) {
            Err(RenderError::LightCapacityExceeded {
                kind: LightKind::Point,
                count: 11,
                capacity: 10,
            }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mesh_uniform_uses_rotation_only_normal_matrix() {
        let transform = Transform::new(spacekit_common::TransformConfig {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            scale: Vec3::splat(4.0),
        });
        let uniform = MeshUniform::from_transform(&transform);
        assert_eq!(uniform.model, transform.matrix().to_cols_array_2d());
        let x_axis = Vec3::from_slice(&uniform.normal[0][..3]);
        assert!(x_axis.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }
}
