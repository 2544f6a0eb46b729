//! Math Helpers
//!
//! Small geometric primitives built on top of `glam`:
//! - [`BoundingBox`] / [`BoundingSphere`]: bounding volumes cached by geometry
//! - [`Ray`]: ray queries against triangles, segments, points, boxes and spheres
//! - [`normal_matrix`]: inverse-transpose of the upper-left 3x3 block

pub mod bounds;
pub mod ray;

pub use bounds::{BoundingBox, BoundingSphere};
pub use ray::Ray;

use glam::{Mat3, Mat4};

/// Computes the matrix used to transform normal vectors: the inverse transpose
/// of the upper-left 3x3 block of `m`.
///
/// A singular block yields [`Mat3::ZERO`].
#[must_use]
pub fn normal_matrix(m: &Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(*m);
    if upper.determinant().abs() <= f32::EPSILON * f32::EPSILON {
        log::warn!("normal_matrix: matrix is not invertible");
        return Mat3::ZERO;
    }
    upper.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let m = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let nm = normal_matrix(&m);
        // A 45° normal on the XY plane must tilt toward Y after stretching X.
        let n = (nm * Vec3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.y > n.x);
    }

    #[test]
    fn normal_matrix_of_singular_matrix_is_zero() {
        let m = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(normal_matrix(&m), Mat3::ZERO);
    }
}
