use glam::{Mat3, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use spacekit_common::Transform;
use std::f32::consts::PI;

/// Construction parameters for a [`DirectionalLightComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLightConfig {
    pub intensity: f32,
    /// RGBA; only RGB reaches the GPU.
    pub color: Vec4,
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            color: Vec4::ONE,
        }
    }
}

/// Light shining along the owner's forward (-Z) axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightComponent {
    pub intensity: f32,
    pub color: Vec4,
}

impl Default for DirectionalLightComponent {
    fn default() -> Self {
        Self::new(DirectionalLightConfig::default())
    }
}

impl DirectionalLightComponent {
    pub fn new(config: DirectionalLightConfig) -> Self {
        Self {
            intensity: config.intensity,
            color: config.color,
        }
    }

    pub fn direction(&self, transform: &Transform) -> Vec3 {
        transform.forward()
    }

    /// Orientation handed to the shader.
    pub fn rotation_matrix(&self, transform: &Transform) -> Mat3 {
        Mat3::from_quat(transform.rotation())
    }
}

/// Construction parameters for a [`PointLightComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLightConfig {
    pub intensity: f32,
    pub color: Vec4,
    pub range: f32,
    /// Cone half-angle in radians around the owner's forward axis. `PI`
    /// lights every direction.
    pub angle: f32,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            color: Vec4::ONE,
            range: 100.0,
            angle: PI,
        }
    }
}

/// Positional light with range falloff and an optional cone.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLightComponent {
    pub intensity: f32,
    pub color: Vec4,
    pub range: f32,
    pub angle: f32,
}

impl Default for PointLightComponent {
    fn default() -> Self {
        Self::new(PointLightConfig::default())
    }
}

impl PointLightComponent {
    pub fn new(config: PointLightConfig) -> Self {
        Self {
            intensity: config.intensity,
            color: config.color,
            range: config.range,
            angle: config.angle,
        }
    }

    pub fn position(&self, transform: &Transform) -> Vec3 {
        transform.position()
    }

    pub fn direction(&self, transform: &Transform) -> Vec3 {
        transform.forward()
    }
}
