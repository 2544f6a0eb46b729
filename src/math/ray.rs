use glam::{Mat4, Vec3};

use crate::math::bounds::{BoundingBox, BoundingSphere};

/// A half-line starting at `origin` and extending along `direction`.
///
/// `direction` is expected to be normalized; distances returned by the
/// queries below are only metric under that assumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Result of [`Ray::distance_sq_to_segment`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDistance {
    pub distance_sq: f32,
    pub point_on_ray: Vec3,
    pub point_on_segment: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Ray {
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline]
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Returns this ray expressed in the space described by `matrix`.
    /// The direction is re-normalized.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction).normalize_or_zero(),
        }
    }

    /// Closest point on the ray to `point`. Points behind the origin map to
    /// the origin itself.
    #[must_use]
    pub fn closest_point_to_point(&self, point: Vec3) -> Vec3 {
        let t = (point - self.origin).dot(self.direction);
        if t < 0.0 { self.origin } else { self.at(t) }
    }

    #[must_use]
    pub fn distance_sq_to_point(&self, point: Vec3) -> f32 {
        self.closest_point_to_point(point).distance_squared(point)
    }

    #[must_use]
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.distance_sq_to_point(sphere.center) <= sphere.radius * sphere.radius
    }

    /// Squared distance between the ray and the segment `v0..v1`, with the
    /// closest points on both.
    ///
    /// Based on the segment/ray distance routine from David Eberly's
    /// Geometric Tools (DistRaySegment).
    #[must_use]
    pub fn distance_sq_to_segment(&self, v0: Vec3, v1: Vec3) -> SegmentDistance {
        let seg_center = (v0 + v1) * 0.5;
        let seg_dir = (v1 - v0).normalize_or_zero();
        let diff = self.origin - seg_center;

        let seg_extent = v0.distance(v1) * 0.5;
        let a01 = -self.direction.dot(seg_dir);
        let b0 = diff.dot(self.direction);
        let b1 = -diff.dot(seg_dir);
        let c = diff.length_squared();
        let det = (1.0 - a01 * a01).abs();

        let (s0, s1, distance_sq);

        if det > 0.0 {
            // The ray and segment are not parallel.
            let mut t0 = a01 * b1 - b0;
            let mut t1 = a01 * b0 - b1;
            let ext_det = seg_extent * det;

            if t0 >= 0.0 {
                if t1 >= -ext_det {
                    if t1 <= ext_det {
                        // Minimum at interior points of ray and segment.
                        let inv_det = 1.0 / det;
                        t0 *= inv_det;
                        t1 *= inv_det;
                        distance_sq = t0 * (t0 + a01 * t1 + 2.0 * b0)
                            + t1 * (a01 * t0 + t1 + 2.0 * b1)
                            + c;
                    } else {
                        t1 = seg_extent;
                        t0 = (-(a01 * t1 + b0)).max(0.0);
                        distance_sq = -t0 * t0 + t1 * (t1 + 2.0 * b1) + c;
                    }
                } else {
                    t1 = -seg_extent;
                    t0 = (-(a01 * t1 + b0)).max(0.0);
                    distance_sq = -t0 * t0 + t1 * (t1 + 2.0 * b1) + c;
                }
            } else if t1 <= -ext_det {
                t0 = (-(-a01 * seg_extent + b0)).max(0.0);
                t1 = if t0 > 0.0 {
                    -seg_extent
                } else {
                    (-b1).clamp(-seg_extent, seg_extent)
                };
                distance_sq = -t0 * t0 + t1 * (t1 + 2.0 * b1) + c;
            } else if t1 <= ext_det {
                t0 = 0.0;
                t1 = (-b1).clamp(-seg_extent, seg_extent);
                distance_sq = t1 * (t1 + 2.0 * b1) + c;
            } else {
                t0 = (-(a01 * seg_extent + b0)).max(0.0);
                t1 = if t0 > 0.0 {
                    seg_extent
                } else {
                    (-b1).clamp(-seg_extent, seg_extent)
                };
                distance_sq = -t0 * t0 + t1 * (t1 + 2.0 * b1) + c;
            }

            s0 = t0;
            s1 = t1;
        } else {
            // Parallel ray and segment.
            s1 = if a01 > 0.0 { -seg_extent } else { seg_extent };
            s0 = (-(a01 * s1 + b0)).max(0.0);
            distance_sq = -s0 * s0 + s1 * (s1 + 2.0 * b1) + c;
        }

        SegmentDistance {
            distance_sq,
            point_on_ray: self.at(s0),
            point_on_segment: seg_center + seg_dir * s1,
        }
    }

    /// Slab test against an axis-aligned box. Returns the entry point, or the
    /// exit point when the origin is inside the box.
    #[must_use]
    pub fn intersect_box(&self, bbox: &BoundingBox) -> Option<Vec3> {
        let inv = self.direction.recip();
        let origin = self.origin;

        let (mut tmin, mut tmax) = if inv.x >= 0.0 {
            ((bbox.min.x - origin.x) * inv.x, (bbox.max.x - origin.x) * inv.x)
        } else {
            ((bbox.max.x - origin.x) * inv.x, (bbox.min.x - origin.x) * inv.x)
        };

        let (tymin, tymax) = if inv.y >= 0.0 {
            ((bbox.min.y - origin.y) * inv.y, (bbox.max.y - origin.y) * inv.y)
        } else {
            ((bbox.max.y - origin.y) * inv.y, (bbox.min.y - origin.y) * inv.y)
        };

        if tmin > tymax || tymin > tmax {
            return None;
        }
        // NaN-aware: 0 * inf happens when the origin lies on a slab plane.
        if tymin > tmin || tmin.is_nan() {
            tmin = tymin;
        }
        if tymax < tmax || tmax.is_nan() {
            tmax = tymax;
        }

        let (tzmin, tzmax) = if inv.z >= 0.0 {
            ((bbox.min.z - origin.z) * inv.z, (bbox.max.z - origin.z) * inv.z)
        } else {
            ((bbox.max.z - origin.z) * inv.z, (bbox.min.z - origin.z) * inv.z)
        };

        if tmin > tzmax || tzmin > tmax {
            return None;
        }
        if tzmin > tmin || tmin.is_nan() {
            tmin = tzmin;
        }
        if tzmax < tmax || tmax.is_nan() {
            tmax = tzmax;
        }

        if tmax < 0.0 {
            return None;
        }

        Some(self.at(if tmin >= 0.0 { tmin } else { tmax }))
    }

    #[must_use]
    pub fn intersects_box(&self, bbox: &BoundingBox) -> bool {
        self.intersect_box(bbox).is_some()
    }

    /// Ray/triangle intersection (Möller–Trumbore variant).
    ///
    /// With `backface_culling` set, only triangles whose counter-clockwise
    /// winding faces the ray origin are hit.
    #[must_use]
    pub fn intersect_triangle(
        &self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        backface_culling: bool,
    ) -> Option<Vec3> {
        let edge1 = b - a;
        let edge2 = c - a;
        let normal = edge1.cross(edge2);

        let mut d_dot_n = self.direction.dot(normal);
        let sign = if d_dot_n > 0.0 {
            if backface_culling {
                return None;
            }
            1.0
        } else if d_dot_n < 0.0 {
            d_dot_n = -d_dot_n;
            -1.0
        } else {
            return None;
        };

        let diff = self.origin - a;
        let d_dot_q_x_e2 = sign * self.direction.dot(diff.cross(edge2));
        if d_dot_q_x_e2 < 0.0 {
            return None;
        }

        let d_dot_e1_x_q = sign * self.direction.dot(edge1.cross(diff));
        if d_dot_e1_x_q < 0.0 {
            return None;
        }

        if d_dot_q_x_e2 + d_dot_e1_x_q > d_dot_n {
            return None;
        }

        let q_dot_n = -sign * diff.dot(normal);
        if q_dot_n < 0.0 {
            return None;
        }

        Some(self.at(q_dot_n / d_dot_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn ray_down(x: f32, y: f32) -> Ray {
        Ray::new(Vec3::new(x, y, 1.0), Vec3::NEG_Z)
    }

    #[test]
    fn triangle_hit_and_miss() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let hit = ray_down(0.2, 0.2).intersect_triangle(a, b, c, true);
        assert!(hit.is_some_and(|p| (p - Vec3::new(0.2, 0.2, 0.0)).length() < EPSILON));
        assert!(ray_down(0.8, 0.8).intersect_triangle(a, b, c, false).is_none());
    }

    #[test]
    fn triangle_backface_culling() {
        // Winding reversed: the triangle now faces away from the ray.
        let (a, b, c) = (Vec3::ZERO, Vec3::Y, Vec3::X);
        assert!(ray_down(0.2, 0.2).intersect_triangle(a, b, c, true).is_none());
        assert!(ray_down(0.2, 0.2).intersect_triangle(a, b, c, false).is_some());
    }

    #[test]
    fn triangle_behind_origin_is_missed() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, -1.0), Vec3::NEG_Z);
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y, false).is_none());
    }

    #[test]
    fn segment_distance_perpendicular() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let d = ray.distance_sq_to_segment(Vec3::new(-1.0, 0.5, 0.0), Vec3::new(1.0, 0.5, 0.0));
        assert!((d.distance_sq - 0.25).abs() < EPSILON);
        assert!((d.point_on_segment - Vec3::new(0.0, 0.5, 0.0)).length() < EPSILON);
        assert!((d.point_on_ray - Vec3::ZERO).length() < EPSILON);
    }

    #[test]
    fn segment_distance_clamps_to_endpoint() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        let d = ray.distance_sq_to_segment(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!((d.distance_sq - 4.0).abs() < 1e-4);
        assert!((d.point_on_segment - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn box_entry_point() {
        let bbox = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let p = ray.intersect_box(&bbox).expect("ray through the box");
        assert!((p - Vec3::new(0.0, 0.0, 1.0)).length() < EPSILON);

        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(!miss.intersects_box(&bbox));
    }

    #[test]
    fn box_from_inside_returns_exit() {
        let bbox = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let p = ray.intersect_box(&bbox).expect("origin inside the box");
        assert!((p - Vec3::X).length() < EPSILON);
    }

    #[test]
    fn closest_point_behind_origin_is_origin() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.closest_point_to_point(Vec3::new(-4.0, 1.0, 0.0)), Vec3::ZERO);
        assert!((ray.distance_sq_to_point(Vec3::new(2.0, 1.0, 0.0)) - 1.0).abs() < EPSILON);
    }
}
