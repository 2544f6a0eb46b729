use glam::{Vec2, Vec3};

use crate::resources::geometry::Geometry;
use crate::resources::primitives::VertexWriter;

/// Outward normal plus the two in-plane axes of each face, with
/// `u × v == normal` so the quads wind counter-clockwise seen from outside.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
];

/// Corner signs along (u, v) and their texture coordinates.
const CORNERS: [(f32, f32, Vec2); 4] = [
    (-1.0, -1.0, Vec2::new(0.0, 1.0)),
    (1.0, -1.0, Vec2::new(1.0, 1.0)),
    (1.0, 1.0, Vec2::new(1.0, 0.0)),
    (-1.0, 1.0, Vec2::new(0.0, 0.0)),
];

/// Axis-aligned box centered at the origin: 4 vertices and 2 triangles per
/// face. Each face is its own group, with material slots 0..6 in the order
/// +Z, -Z, +Y, -Y, +X, -X.
#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vec3::new(width, height, depth) * 0.5;
    let mut writer = VertexWriter::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let [a, b, c, d] = CORNERS.map(|(su, sv, uv)| writer.push((normal + u * su + v * sv) * half, normal, uv));
        indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    let mut geometry = writer.finish(indices);
    for face in 0..6 {
        geometry.add_group(face * 6, 6, face);
    }
    geometry
}
