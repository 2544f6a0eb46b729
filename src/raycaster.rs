//! Ray picking against graphics and scenes.

use glam::{Mat4, Vec2, Vec3};

use crate::math::Ray;
use crate::scene::NodeHandle;
use crate::scene::camera::{Camera, ProjectionType};

/// A ray plus the acceptance rules graphics apply when testing against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raycaster {
    /// World-space ray. The direction is expected to be normalized.
    pub ray: Ray,
    /// Hits closer than this are discarded.
    pub near: f32,
    /// Hits farther than this are discarded.
    pub far: f32,
    /// Maximum distance between the ray and a line segment.
    pub line_precision: f32,
    /// Maximum distance between the ray and a point, in world units.
    pub point_precision: f32,
    /// View matrix used by sprites, which are hit-tested in camera space.
    pub view_matrix: Mat4,
}

impl Raycaster {
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            ray: Ray::new(origin, direction),
            near: 0.0,
            far: f32::INFINITY,
            line_precision: 1.0,
            point_precision: 1.0,
            view_matrix: Mat4::IDENTITY,
        }
    }

    /// Ray through normalized device coordinates `ndc` (`[-1, 1]` on both
    /// axes, +Y up) of `camera`.
    #[must_use]
    pub fn from_camera(camera: &Camera, ndc: Vec2) -> Self {
        let inverse = camera.view_projection_matrix().inverse();
        let near_point = inverse.project_point3(ndc.extend(0.0));
        let far_point = inverse.project_point3(ndc.extend(1.0));

        let origin = match camera.projection_type {
            ProjectionType::Perspective => camera.position(),
            ProjectionType::Orthographic => near_point,
        };
        let direction = (far_point - near_point).normalize_or(Vec3::NEG_Z);

        let mut raycaster = Self::new(origin, direction);
        raycaster.view_matrix = *camera.view_matrix();
        raycaster
    }

    #[must_use]
    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.near && distance <= self.far
    }
}

/// One ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance from the ray origin to `point`.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// First vertex of the face / segment, or the point index.
    pub index: usize,
    /// Node owning the graphic; set by scene-level raycasts.
    pub node: Option<NodeHandle>,
}

impl Intersection {
    #[must_use]
    pub fn new(distance: f32, point: Vec3, index: usize) -> Self {
        Self {
            distance,
            point,
            index,
            node: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_ray_points_through_screen_center() {
        let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

        let raycaster = Raycaster::from_camera(&camera, Vec2::ZERO);
        assert!((raycaster.ray.origin - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
        assert!((raycaster.ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn range_is_inclusive() {
        let mut raycaster = Raycaster::new(Vec3::ZERO, Vec3::Z);
        raycaster.near = 1.0;
        raycaster.far = 2.0;
        assert!(raycaster.in_range(1.0));
        assert!(raycaster.in_range(2.0));
        assert!(!raycaster.in_range(0.5));
        assert!(!raycaster.in_range(2.5));
    }
}
