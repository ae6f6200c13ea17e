use glam::Vec3;
use spacekit_ecs::VERTEX_FLOATS;

/// (normal, u axis, v axis) per face, with `u x v == normal` so corners
/// listed counter-clockwise in (u, v) face outward.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Unit cube spanning `[-1, 1]` on every axis: 36 interleaved vertices,
/// counter-clockwise front faces, one full texture per face.
pub fn cube_vertices() -> Vec<f32> {
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let mut vertices = Vec::with_capacity(36 * VERTEX_FLOATS);
    for (normal, u_axis, v_axis) in CUBE_FACES {
        for corner in [0, 1, 2, 0, 2, 3] {
            let (su, sv) = CORNERS[corner];
            let position = normal + u_axis * su + v_axis * sv;
            vertices.extend_from_slice(&position.to_array());
            vertices.push((su + 1.0) * 0.5);
            vertices.push((1.0 - sv) * 0.5);
            vertices.extend_from_slice(&normal.to_array());
        }
    }
    vertices
}
