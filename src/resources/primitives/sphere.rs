use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::resources::geometry::Geometry;
use crate::resources::primitives::VertexWriter;

/// UV sphere centered at the origin.
///
/// Rings run from the south pole (v = 1) to the north pole (v = 0). The pole
/// rows emit one triangle per segment instead of a quad, so the index buffer
/// carries no zero-area faces.
#[must_use]
pub fn create_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let columns = width_segments.max(3);
    let rows = height_segments.max(2);
    let stride = columns + 1;

    let mut writer = VertexWriter::with_capacity(((rows + 1) * stride) as usize);
    for y in 0..=rows {
        let v = y as f32 / rows as f32;
        let (ring, height) = (v * PI).sin_cos();
        for x in 0..=columns {
            let u = x as f32 / columns as f32;
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let normal = Vec3::new(-ring * cos_phi, -height, ring * sin_phi);
            writer.push(normal * radius, normal, Vec2::new(u, 1.0 - v));
        }
    }

    let mut indices = Vec::with_capacity((rows * columns * 6) as usize);
    for y in 0..rows {
        for x in 0..columns {
            let v0 = y * stride + x;
            let v1 = v0 + 1;
            let v2 = v0 + stride;
            let v3 = v2 + 1;
            if y != 0 {
                indices.extend_from_slice(&[v0, v1, v2]);
            }
            if y != rows - 1 {
                indices.extend_from_slice(&[v1, v3, v2]);
            }
        }
    }

    writer.finish(indices)
}
