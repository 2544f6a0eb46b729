use glam::{Affine3A, Mat4, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point expands. Used as the neutral element
    /// when folding boxes together.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn center(&self) -> Vec3 { (self.min + self.max) * 0.5 }
    pub fn size(&self) -> Vec3 { self.max - self.min }

    pub fn expand_by_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms all eight corners and returns the box enclosing them.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut out = Self::empty();
        for point in corners {
            out.expand_by_point(matrix.transform_point3(point));
        }
        out
    }
}

/// Bounding sphere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Moves the sphere into the space described by `matrix`. The radius is
    /// scaled by the largest axis scale so the result still encloses the
    /// transformed volume.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let max_scale = matrix
            .x_axis
            .truncate()
            .length_squared()
            .max(matrix.y_axis.truncate().length_squared())
            .max(matrix.z_axis.truncate().length_squared())
            .sqrt();
        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_transform_uses_largest_scale() {
        let sphere = BoundingSphere::new(Vec3::X, 1.0);
        let m = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0))
            * Mat4::from_scale(Vec3::new(1.0, 3.0, 2.0));
        let moved = sphere.transform(&m);
        assert!((moved.radius - 3.0).abs() < 1e-5);
        assert!((moved.center - Vec3::new(1.0, 5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn empty_box_is_expanded_by_first_point() {
        let mut bb = BoundingBox::empty();
        assert!(bb.is_empty());
        bb.expand_by_point(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(bb.min, bb.max);
        assert!(!bb.is_empty());
    }
}
