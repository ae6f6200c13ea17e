//! Keyboard axes and camera drive.
//!
//! Window toolkits translate their key events into [`Key`] and feed
//! [`InputState`]; [`FlyController`] turns the resulting axes into
//! transform motion once per frame.
//!
//! # Invariants
//! - Axis values are always -1, 0 or 1.
//! - Focus loss clears every held key.
//! - Input never reads the clock; motion is per frame, not per second.

mod controller;

pub use controller::FlyController;

use glam::Vec3;

/// Keys with a meaning for camera drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Horizontal axis, positive.
    D,
    /// Horizontal axis, negative.
    A,
    /// Vertical axis, positive.
    W,
    /// Vertical axis, negative.
    S,
    /// Switches the controller from moving to turning.
    Modifier,
}

/// Currently held keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    right: bool,
    left: bool,
    forward: bool,
    back: bool,
    modifier: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.set(key, false);
    }

    pub fn set(&mut self, key: Key, pressed: bool) {
        let slot = match key {
            Key::D => &mut self.right,
            Key::A => &mut self.left,
            Key::W => &mut self.forward,
            Key::S => &mut self.back,
            Key::Modifier => &mut self.modifier,
        };
        if *slot != pressed {
            tracing::trace!(?key, pressed, "key state changed");
        }
        *slot = pressed;
    }

    /// Release everything, e.g. when the window loses focus and release
    /// events will never arrive.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// D minus A.
    pub fn axis_horizontal(&self) -> f32 {
        axis(self.right, self.left)
    }

    /// W minus S.
    pub fn axis_vertical(&self) -> f32 {
        axis(self.forward, self.back)
    }

    /// `(horizontal, 0, vertical)`.
    pub fn axis_vec3(&self) -> Vec3 {
        Vec3::new(self.axis_horizontal(), 0.0, self.axis_vertical())
    }

    pub fn is_modifier_pressed(&self) -> bool {
        self.modifier
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}
