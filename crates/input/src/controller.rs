use crate::InputState;
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use spacekit_common::Transform;

/// Per-frame fly camera: moves along the input axes in its own frame, or
/// turns while the modifier is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyController {
    /// Units moved per frame per axis.
    pub speed: f32,
    /// Radians turned per frame per axis.
    pub angle_speed: f32,
}

impl Default for FlyController {
    fn default() -> Self {
        Self {
            speed: 0.6,
            angle_speed: 0.02,
        }
    }
}

impl FlyController {
    /// Apply one frame of input to `transform`. Returns whether anything
    /// changed.
    pub fn apply(&self, input: &InputState, transform: &mut Transform) -> bool {
        if input.is_modifier_pressed() {
            let yaw = input.axis_horizontal() * self.angle_speed;
            let pitch = input.axis_vertical() * self.angle_speed;
            if yaw == 0.0 && pitch == 0.0 {
                return false;
            }
            transform.rotate(Quat::from_euler(EulerRot::XYZ, 0.0, yaw, 0.0), None);
            transform.rotate(
                Quat::from_euler(EulerRot::XYZ, pitch, 0.0, 0.0),
                Some(&Transform::world()),
            );
        } else {
            let axes = input.axis_vec3();
            if axes == Vec3::ZERO {
                return false;
            }
            transform.translate(axes * self.speed, None);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn forward_moves_along_negative_z() {
        let mut input = InputState::new();
        input.press(Key::W);
        let mut transform = Transform::world();
        assert!(FlyController::default().apply(&input, &mut transform));
        assert!(approx(transform.position(), Vec3::new(0.0, 0.0, -0.6)));
    }

    #[test]
    fn strafe_moves_along_x() {
        let mut input = InputState::new();
        input.press(Key::D);
        let mut transform = Transform::world();
        FlyController::default().apply(&input, &mut transform);
        assert!(approx(transform.position(), Vec3::new(0.6, 0.0, 0.0)));
    }

    #[test]
    fn modifier_turns_instead_of_moving() {
        let mut input = InputState::new();
        input.press(Key::Modifier);
        input.press(Key::D);
        let mut transform = Transform::world();
        assert!(FlyController::default().apply(&input, &mut transform));
        assert_eq!(transform.position(), Vec3::ZERO);
        let expected = Quat::from_rotation_y(0.02);
        assert!(transform.rotation().angle_between(expected) < 1e-5);
    }

    #[test]
    fn pitch_is_applied_in_world_frame() {
        let mut input = InputState::new();
        input.press(Key::Modifier);
        input.press(Key::W);
        let mut transform = Transform::world();
        FlyController::default().apply(&input, &mut transform);
        let expected = Quat::from_rotation_x(0.02);
        assert!(transform.rotation().angle_between(expected) < 1e-5);
    }

    #[test]
    fn idle_input_leaves_transform_alone() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let before = transform;
        let mut input = InputState::new();
        assert!(!FlyController::default().apply(&input, &mut transform));
        input.press(Key::Modifier);
        assert!(!FlyController::default().apply(&input, &mut transform));
        assert_eq!(transform, before);
    }

    #[test]
    fn controller_config_from_partial_json() {
        let controller: FlyController = serde_json::from_str(r#"{"speed": 2.0}"#).unwrap();
        assert_eq!(controller.speed, 2.0);
        assert_eq!(controller.angle_speed, 0.02);
    }
}
