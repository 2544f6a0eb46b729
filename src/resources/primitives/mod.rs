//! Procedural geometry generators.
//!
//! Generators write one interleaved position / normal / uv buffer and
//! register it through `add_vertex_buffer`, the same path an asset loader
//! takes.

pub mod box_shape;
pub mod sphere;

pub use box_shape::create_box;
pub use sphere::create_sphere;

use glam::{Vec2, Vec3};

use crate::resources::buffer::{AttribKind, VertexBuffer};
use crate::resources::geometry::Geometry;

/// Floats per generated vertex: position (3), normal (3), uv (2).
const FLOATS_PER_VERTEX: usize = 8;

/// Interleaved vertex data under construction.
struct VertexWriter {
    data: Vec<f32>,
}

impl VertexWriter {
    fn with_capacity(vertices: usize) -> Self {
        Self {
            data: Vec::with_capacity(vertices * FLOATS_PER_VERTEX),
        }
    }

    /// Appends one vertex and returns its index.
    fn push(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = (self.data.len() / FLOATS_PER_VERTEX) as u32;
        self.data.extend_from_slice(&position.to_array());
        self.data.extend_from_slice(&normal.to_array());
        self.data.extend_from_slice(&uv.to_array());
        index
    }

    fn finish(self, indices: Vec<u32>) -> Geometry {
        let vbo = VertexBuffer::new()
            .with_attribute(AttribKind::Position, 3)
            .with_attribute(AttribKind::Normal, 3)
            .with_attribute(AttribKind::TexCoord, 2)
            .with_data(self.data);

        let mut geometry = Geometry::new();
        if let Err(err) = geometry.add_vertex_buffer(vbo) {
            log::error!("primitive generator produced an invalid buffer: {err}");
        }
        geometry.set_indices(indices);
        geometry
    }
}
