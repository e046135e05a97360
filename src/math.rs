//! Vector and matrix kernel.
//!
//! The crate works in `f64` throughout and uses `glam`'s double-precision
//! types directly. Matrices are column-major. A [`Mat3`] acts on homogeneous
//! 2D coordinates `(x, y, 1)` and may carry a projective bottom row. A
//! [`Mat4`] is only ever the GL lift of a `Mat3` (see
//! [`Mat3Ext::lift_to_mat4`]).
//!
//! The extension traits add the handful of operations the homography solver
//! and the coordinate pipeline need on top of what `glam` provides.

#[cfg(test)]
#[path = "math_test.rs"]
mod math_test;

use std::f64::consts::TAU;

pub use glam::{DMat3 as Mat3, DMat4 as Mat4, DVec2 as Vec2, DVec3 as Vec3};
use glam::DVec4;

use crate::consts::MATRIX_EPSILON;

/// Extra operations on 2D points.
pub trait Vec2Ext: Sized {
    /// Rotate counter-clockwise by `angle` radians about `center`.
    #[must_use]
    fn rotate_around(self, center: Vec2, angle: f64) -> Self;

    /// Angle from the +x axis, normalized to `[0, 2π)`.
    #[must_use]
    fn angle(self) -> f64;

    /// Clamp both components to `[-1, 1]`.
    #[must_use]
    fn clamp_to_unit_square(self) -> Self;
}

impl Vec2Ext for Vec2 {
    fn rotate_around(self, center: Vec2, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let d = self - center;
        center + Vec2::new(d.x * c - d.y * s, d.x * s + d.y * c)
    }

    fn angle(self) -> f64 {
        let a = self.y.atan2(self.x).rem_euclid(TAU);
        if a >= TAU { 0.0 } else { a }
    }

    fn clamp_to_unit_square(self) -> Self {
        self.clamp(Vec2::splat(-1.0), Vec2::splat(1.0))
    }
}

/// Extra operations on 3x3 homogeneous matrices.
pub trait Mat3Ext: Sized {
    /// Build from rows, which reads closer to the usual written form.
    #[must_use]
    fn from_rows(rows: [[f64; 3]; 3]) -> Self;

    /// Rotation by `angle` radians about `center`.
    #[must_use]
    fn rotation_around(center: Vec2, angle: f64) -> Self;

    /// Apply to `(p.x, p.y, 1)` and divide by the resulting `w`.
    ///
    /// Returns `None` when `w` is (numerically) zero, i.e. the point maps to
    /// infinity.
    fn project_point(&self, p: Vec2) -> Option<Vec2>;

    /// Inverse, or `None` if the matrix is singular or non-finite.
    fn try_inverse(&self) -> Option<Self>;

    /// Divide every entry by the bottom-right one, which then reads exactly 1.
    fn normalized(&self) -> Option<Self>;

    /// Lift into the 4x4 form used by the GL renderer.
    ///
    /// The x, y and w rows/columns land on 4x4 indices 0, 1 and 3; z is
    /// passed through untouched so planar content keeps its depth ordering.
    #[must_use]
    fn lift_to_mat4(&self) -> Mat4;

    /// Entry-wise comparison against the identity.
    fn approx_identity(&self, eps: f64) -> bool;
}

impl Mat3Ext for Mat3 {
    fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Mat3::from_cols_array_2d(&rows).transpose()
    }

    fn rotation_around(center: Vec2, angle: f64) -> Self {
        Mat3::from_translation(center) * Mat3::from_angle(angle) * Mat3::from_translation(-center)
    }

    fn project_point(&self, p: Vec2) -> Option<Vec2> {
        let h = *self * p.extend(1.0);
        if !h.z.is_finite() || h.z.abs() < MATRIX_EPSILON {
            return None;
        }
        let out = h.truncate() / h.z;
        out.is_finite().then_some(out)
    }

    fn try_inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < MATRIX_EPSILON {
            return None;
        }
        let inv = self.inverse();
        inv.is_finite().then_some(inv)
    }

    fn normalized(&self) -> Option<Self> {
        let w = self.z_axis.z;
        if !w.is_finite() || w.abs() < MATRIX_EPSILON {
            return None;
        }
        let mut out = Mat3::from_cols(self.x_axis / w, self.y_axis / w, self.z_axis / w);
        out.z_axis.z = 1.0;
        Some(out)
    }

    fn lift_to_mat4(&self) -> Mat4 {
        let [x, y, w] = [self.x_axis, self.y_axis, self.z_axis];
        Mat4::from_cols(
            DVec4::new(x.x, x.y, 0.0, x.z),
            DVec4::new(y.x, y.y, 0.0, y.z),
            DVec4::new(0.0, 0.0, 1.0, 0.0),
            DVec4::new(w.x, w.y, 0.0, w.z),
        )
    }

    fn approx_identity(&self, eps: f64) -> bool {
        self.abs_diff_eq(Mat3::IDENTITY, eps)
    }
}
