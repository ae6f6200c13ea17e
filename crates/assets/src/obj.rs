//! Wavefront OBJ parsing into interleaved vertex data.
//!
//! Only `v`, `vt` and `f` records are interpreted. Faces are fan-triangulated
//! and every emitted vertex carries the flat normal of its triangle. Texture
//! V coordinates are flipped to `1 - v` to match the sampler's origin.

use crate::AssetError;
use glam::Vec3;
use spacekit_ecs::VERTEX_FLOATS;

/// Geometry parsed from one OBJ document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    /// Interleaved `[x, y, z, u, v, nx, ny, nz]` per vertex.
    pub vertices: Vec<f32>,
    pub triangles: usize,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_FLOATS
    }
}

#[derive(Clone, Copy)]
struct Corner {
    position: Vec3,
    uv: [f32; 2],
}

pub fn parse_obj(source: &str) -> Result<ObjMesh, AssetError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut mesh = ObjMesh::default();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut tokens = text.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line, "vertex position")?;
                positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let u = parse_float(tokens.next(), line, "texture coordinate")?;
                let v = match tokens.next() {
                    Some(token) => parse_float(Some(token), line, "texture coordinate")?,
                    None => 0.0,
                };
                uvs.push([u, v]);
            }
            "f" => {
                let corners = tokens
                    .map(|token| resolve_corner(token, &positions, &uvs, line))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(AssetError::Parse {
                        line,
                        message: format!("face has {} vertices, need at least 3", corners.len()),
                    });
                }
                for j in 1..corners.len() - 1 {
                    push_triangle(&mut mesh, [corners[0], corners[j], corners[j + 1]]);
                }
            }
            // Normals are recomputed per face; grouping and material
            // records have no counterpart here.
            _ => {}
        }
    }

    tracing::debug!(
        positions = positions.len(),
        triangles = mesh.triangles,
        "parsed OBJ"
    );
    Ok(mesh)
}

fn push_triangle(mesh: &mut ObjMesh, triangle: [Corner; 3]) {
    let [a, b, c] = triangle.map(|corner| corner.position);
    let normal = (b - a).cross(c - a);
    for corner in triangle {
        mesh.vertices.extend_from_slice(&corner.position.to_array());
        mesh.vertices.push(corner.uv[0]);
        mesh.vertices.push(1.0 - corner.uv[1]);
        mesh.vertices.extend_from_slice(&normal.to_array());
    }
    mesh.triangles += 1;
}

fn resolve_corner(
    token: &str,
    positions: &[Vec3],
    uvs: &[[f32; 2]],
    line: usize,
) -> Result<Corner, AssetError> {
    let mut parts = token.split('/');
    let position_ref = parts.next().unwrap_or_default();
    let position = *lookup(positions, position_ref, line, "position")?;
    let uv = match parts.next() {
        Some(reference) if !reference.is_empty() => {
            *lookup(uvs, reference, line, "texture coordinate")?
        }
        _ => [0.0, 0.0],
    };
    Ok(Corner { position, uv })
}

/// Resolve a 1-based (or negative, relative-to-end) OBJ reference.
fn lookup<'a, T>(
    items: &'a [T],
    reference: &str,
    line: usize,
    what: &str,
) -> Result<&'a T, AssetError> {
    let parsed: i64 = reference.parse().map_err(|_| AssetError::Parse {
        line,
        message: format!("invalid {what} index `{reference}`"),
    })?;
    let len = items.len() as i64;
    let resolved = match parsed {
        0 => None,
        n if n > 0 => Some(n - 1),
        n => Some(len + n),
    };
    resolved
        .filter(|i| (0..len).contains(i))
        .and_then(|i| items.get(i as usize))
        .ok_or_else(|| AssetError::Parse {
            line,
            message: format!("{what} index {parsed} out of range ({len} defined)"),
        })
}

fn parse_float(token: Option<&str>, line: usize, what: &str) -> Result<f32, AssetError> {
    let token = token.ok_or_else(|| AssetError::Parse {
        line,
        message: format!("missing {what} component"),
    })?;
    token.parse().map_err(|_| AssetError::Parse {
        line,
        message: format!("invalid {what} component `{token}`"),
    })
}

fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<[f32; N], AssetError> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = parse_float(tokens.next(), line, what)?;
    }
    Ok(out)
}
