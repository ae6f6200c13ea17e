use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`Transform`]. Omitted fields take the
/// identity values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Local position, rotation and scale of one entity plus the derived world
/// matrix.
///
/// The matrix is `translate(position) * rotate(rotation) * scale(scale)` and
/// is recomputed by every setter, so it is never stale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformConfig", into = "TransformConfig")]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

impl From<TransformConfig> for Transform {
    fn from(config: TransformConfig) -> Self {
        Self::new(config)
    }
}

impl From<Transform> for TransformConfig {
    fn from(transform: Transform) -> Self {
        transform.config()
    }
}

impl Transform {
    pub fn new(config: TransformConfig) -> Self {
        let mut transform = Self {
            position: config.position,
            rotation: config.rotation,
            scale: config.scale,
            matrix: Mat4::IDENTITY,
        };
        transform.recompute();
        transform
    }

    /// The fixed world-identity transform. Used as the reference frame for
    /// world-relative `translate`/`rotate`.
    pub fn world() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(TransformConfig {
            position,
            ..Default::default()
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Cached world matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn config(&self) -> TransformConfig {
        TransformConfig {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recompute();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.recompute();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.recompute();
    }

    /// Move by `vector` expressed in the frame of `relative_to` (own frame
    /// when `None`).
    ///
    /// Z is negated before the vector is rotated by the inverse of the
    /// reference rotation, so +Z input moves "forward". With the entity's own
    /// transform this is a view-space move; with [`Transform::world`] it is a
    /// plain world-space offset.
    pub fn translate(&mut self, vector: Vec3, relative_to: Option<&Transform>) {
        let reference = relative_to.map_or(self.rotation, |t| t.rotation);
        let flipped = Vec3::new(vector.x, vector.y, -vector.z);
        let offset = reference.inverse() * flipped;
        self.set_position(self.position + offset);
    }

    /// Rotate by `rotation`.
    ///
    /// Without a reference the rotation is applied in local space
    /// (post-multiplied). With a reference, `rotation` is re-expressed in the
    /// reference frame (`r * q * r⁻¹`) and applied before the current
    /// rotation. Passing a transform equal to `self` reduces to the local case.
    pub fn rotate(&mut self, rotation: Quat, relative_to: Option<&Transform>) {
        let next = match relative_to {
            Some(reference) => {
                let r = reference.rotation;
                let delta = r * rotation * r.conjugate();
                delta * self.rotation
            }
            None => self.rotation * rotation,
        };
        self.set_rotation(next.normalize());
    }

    /// Component-wise multiply the current scale.
    pub fn scale_by(&mut self, factor: Vec3) {
        self.set_scale(self.scale * factor);
    }

    /// Rotation-only normal matrix. Scale is ignored, which is exact for
    /// uniform scale only.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_quat(self.rotation)
    }

    /// Local -Z axis rotated into world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    fn recompute(&mut self) {
        self.matrix = Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale);
    }
}
