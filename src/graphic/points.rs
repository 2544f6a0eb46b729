use crate::errors::Result;
use crate::graphic::{model_space_ray, Graphic};
use crate::raycaster::{Intersection, Raycaster};
use crate::renderer::device::{upload_mat4, GraphicsDevice};
use crate::scene::transform::Transform;

pub(super) fn transfer_uniforms(graphic: &Graphic, device: &mut dyn GraphicsDevice) {
    upload_mat4(device, "ModelViewMatrix", graphic.model_view_matrix());
    upload_mat4(device, "MVP", graphic.mvp_matrix());
}

/// Point raycast. The world precision is converted to model space using the
/// node's average world scale.
pub(super) fn raycast(
    graphic: &Graphic,
    transform: &Transform,
    raycaster: &Raycaster,
    hits: &mut Vec<Intersection>,
) -> Result<()> {
    let Some((world, ray)) = model_space_ray(graphic, transform, raycaster)? else {
        return Ok(());
    };

    let scale = transform.world_scale();
    let avg_scale = (scale.x + scale.y + scale.z) / 3.0;
    let threshold = raycaster.point_precision / avg_scale;
    let threshold_sq = threshold * threshold;

    let geometry = graphic.geometry().borrow();
    for (index, vertex) in geometry.base().vertices().enumerate() {
        if ray.distance_sq_to_point(vertex) >= threshold_sq {
            continue;
        }
        let point = world.transform_point3(ray.closest_point_to_point(vertex));
        let distance = raycaster.ray.origin.distance(point);
        if raycaster.in_range(distance) {
            hits.push(Intersection::new(distance, point, index));
        }
    }
    Ok(())
}
