use std::f32::consts::PI;

use glam::{EulerRot, Mat4, Quat};

use crate::errors::Result;
use crate::graphic::Graphic;
use crate::raycaster::{Intersection, Raycaster};
use crate::renderer::device::{upload_mat4, GraphicsDevice};
use crate::resources::buffer::{AttribKind, VertexBuffer};
use crate::resources::geometry::Geometry;
use crate::scene::transform::Transform;

/// Replaces the rotation of a model-view matrix so the quad faces the
/// camera.
///
/// Translation and scale of `model_view` are kept. The new rotation keeps
/// only the node's own rotation around Z; a negative X scale turns the quad
/// around Y so it is mirrored rather than back-facing. Rendering and
/// raycasting both go through this function.
#[must_use]
pub fn billboard(model_view: &Mat4, transform: &Transform) -> Mat4 {
    let (scale, _, translation) = model_view.to_scale_rotation_translation();
    let z = transform.rotation_euler().z;
    let y = if transform.scale.x >= 0.0 { 0.0 } else { PI };
    let rotation = Quat::from_euler(EulerRot::XYZ, 0.0, y, z);
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

pub(super) fn quad_geometry(width: f32, height: f32) -> Geometry {
    let (w, h) = (width / 2.0, height / 2.0);
    #[rustfmt::skip]
    let data = vec![
        // x   y    z    u    v
        -w, -h, 0.0, 0.0, 0.0,
         w, -h, 0.0, 1.0, 0.0,
         w,  h, 0.0, 1.0, 1.0,
        -w,  h, 0.0, 0.0, 1.0,
    ];
    let vbo = VertexBuffer::new()
        .with_attribute(AttribKind::Position, 3)
        .with_attribute(AttribKind::TexCoord, 2)
        .with_data(data);

    let mut geometry = Geometry::new();
    if let Err(err) = geometry.add_vertex_buffer(vbo) {
        log::error!("sprite quad: {err}");
    }
    geometry.set_indices(vec![0, 1, 2, 0, 2, 3]);
    geometry
}

pub(super) fn transfer_uniforms(graphic: &Graphic, device: &mut dyn GraphicsDevice) {
    upload_mat4(device, "MVP", graphic.mvp_matrix());
}

/// Raycast in camera space against the billboarded quad. A sprite reports
/// at most one hit.
pub(super) fn raycast(
    graphic: &Graphic,
    transform: &Transform,
    raycaster: &Raycaster,
    hits: &mut Vec<Intersection>,
) -> Result<()> {
    let view = raycaster.view_matrix;
    let ray = raycaster.ray.transformed(&view);
    let model_view = billboard(&(view * transform.world_matrix_as_mat4()), transform);

    let geometry = graphic.geometry().borrow();
    let hit = geometry.base().faces().find_map(|face| {
        ray.intersect_triangle(
            model_view.transform_point3(face.a),
            model_view.transform_point3(face.b),
            model_view.transform_point3(face.c),
            false,
        )
        .map(|point| (face.first, point))
    });

    if let Some((index, point)) = hit {
        let distance = ray.origin.distance(point);
        if raycaster.in_range(distance) {
            let point = view.inverse().transform_point3(point);
            hits.push(Intersection::new(distance, point, index));
        }
    }
    Ok(())
}
