use glam::Mat4;
use serde::{Deserialize, Serialize};
use spacekit_common::Transform;
use std::f32::consts::PI;

/// Construction parameters for a [`CameraComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub far: f32,
    pub near: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            far: 100.0,
            near: 1.0,
            fov: 2.0 * PI / 5.0,
            screen_width: 800,
            screen_height: 600,
        }
    }
}

/// Perspective camera. Its pose comes from the owning entity's transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    pub far: f32,
    pub near: f32,
    pub fov: f32,
    screen_width: u32,
    screen_height: u32,
    aspect: f32,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl CameraComponent {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            far: config.far,
            near: config.near,
            fov: config.fov,
            screen_width: 0,
            screen_height: 0,
            aspect: 1.0,
        };
        camera.set_screen_sizes(config.screen_width, config.screen_height);
        camera
    }

    /// Update the viewport size and aspect ratio. A zero height keeps the
    /// previous aspect.
    pub fn set_screen_sizes(&mut self, width: u32, height: u32) {
        self.screen_width = width;
        self.screen_height = height;
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Right-handed perspective mapping depth to `[0, 1]`.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// `rotate(rotation) * translate(-position)` of the owner's transform.
    pub fn view_matrix(&self, transform: &Transform) -> Mat4 {
        Mat4::from_quat(transform.rotation()) * Mat4::from_translation(-transform.position())
    }

    pub fn view_projection(&self, transform: &Transform) -> Mat4 {
        self.projection_matrix() * self.view_matrix(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn defaults_match_config_defaults() {
        let camera = CameraComponent::default();
        assert_eq!(camera.far, 100.0);
        assert_eq!(camera.near, 1.0);
        assert!((camera.fov - 2.0 * PI / 5.0).abs() < 1e-6);
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn set_screen_sizes_updates_aspect() {
        let mut camera = CameraComponent::default();
        camera.set_screen_sizes(1920, 1080);
        assert_eq!(camera.screen_size(), (1920, 1080));
        assert!((camera.aspect() - 16.0 / 9.0).abs() < 1e-6);

        camera.set_screen_sizes(100, 0);
        assert!((camera.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn view_moves_world_opposite_to_camera() {
        let camera = CameraComponent::default();
        let transform = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let view = camera.view_matrix(&transform);
        let p = view.transform_point3(Vec3::new(0.0, 5.0, -10.0));
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -10.0), 1e-5));
    }

    #[test]
    fn point_ahead_of_camera_lands_inside_clip_volume() {
        let camera = CameraComponent::new(CameraConfig {
            far: 800.0,
            ..Default::default()
        });
        let transform = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let clip = camera.view_projection(&transform) * Vec4::new(0.0, 5.0, -10.0, 1.0);
        assert!(clip.w > 0.0);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
        assert!((clip.x / clip.w).abs() < 1e-5);
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: CameraConfig = serde_json::from_str(r#"{"far": 800.0}"#).unwrap();
        assert_eq!(config.far, 800.0);
        assert_eq!(config.near, 1.0);
    }
}
