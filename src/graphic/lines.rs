use crate::errors::Result;
use crate::graphic::{model_space_ray, Graphic};
use crate::raycaster::{Intersection, Raycaster};
use crate::renderer::device::{upload_mat4, GraphicsDevice};
use crate::scene::transform::Transform;

pub(super) fn transfer_uniforms(graphic: &Graphic, device: &mut dyn GraphicsDevice) {
    upload_mat4(device, "MVP", graphic.mvp_matrix());
}

/// Segment raycast. `step` is 2 for independent segments and 1 for strips.
/// The precision test runs in model space; the reported point is the
/// closest point on the segment, in world space.
pub(super) fn raycast(
    graphic: &Graphic,
    transform: &Transform,
    raycaster: &Raycaster,
    step: usize,
    hits: &mut Vec<Intersection>,
) -> Result<()> {
    let Some((world, ray)) = model_space_ray(graphic, transform, raycaster)? else {
        return Ok(());
    };
    let precision_sq = raycaster.line_precision * raycaster.line_precision;

    let geometry = graphic.geometry().borrow();
    for segment in geometry.base().segments(step) {
        let closest = ray.distance_sq_to_segment(segment.a, segment.b);
        if closest.distance_sq > precision_sq {
            continue;
        }

        let on_ray = world.transform_point3(closest.point_on_ray);
        let distance = raycaster.ray.origin.distance(on_ray);
        if !raycaster.in_range(distance) {
            continue;
        }
        let point = world.transform_point3(closest.point_on_segment);
        hits.push(Intersection::new(distance, point, segment.first));
    }
    Ok(())
}
