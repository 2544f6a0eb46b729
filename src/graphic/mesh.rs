use crate::errors::Result;
use crate::graphic::{model_space_ray, Graphic};
use crate::math::normal_matrix;
use crate::raycaster::{Intersection, Raycaster};
use crate::renderer::device::{upload_mat3, upload_mat4, GraphicsDevice};
use crate::resources::material::Side;
use crate::scene::transform::Transform;

pub(super) fn transfer_uniforms(graphic: &Graphic, device: &mut dyn GraphicsDevice) {
    upload_mat4(device, "ModelMatrix", graphic.model_matrix());
    upload_mat4(device, "ModelViewMatrix", graphic.model_view_matrix());
    upload_mat4(device, "MVP", graphic.mvp_matrix());
    upload_mat3(device, "NormalMatrix", &normal_matrix(graphic.model_view_matrix()));
}

/// Triangle raycast: world-space sphere reject, model-space box reject, then
/// every face, wound according to the material's side.
pub(super) fn raycast(
    graphic: &Graphic,
    transform: &Transform,
    raycaster: &Raycaster,
    hits: &mut Vec<Intersection>,
) -> Result<()> {
    let Some((world, ray)) = model_space_ray(graphic, transform, raycaster)? else {
        return Ok(());
    };

    let geometry = graphic.geometry().borrow();
    let base = geometry.base();
    if !ray.intersects_box(&base.bounding_box()) {
        return Ok(());
    }

    for face in base.faces() {
        let side = graphic.material_at(face.first).map_or(Side::Front, |m| m.side());
        let hit = match side {
            Side::Front => ray.intersect_triangle(face.a, face.b, face.c, true),
            Side::Back => ray.intersect_triangle(face.c, face.b, face.a, true),
            Side::Double => ray.intersect_triangle(face.a, face.b, face.c, false),
        };
        let Some(point) = hit else {
            continue;
        };

        let point = world.transform_point3(point);
        let distance = raycaster.ray.origin.distance(point);
        if raycaster.in_range(distance) {
            hits.push(Intersection::new(distance, point, face.first));
        }
    }
    Ok(())
}
