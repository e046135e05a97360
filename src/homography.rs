//! Quad-to-quad projective transform solver.
//!
//! A homography is fixed by four point correspondences. The solver uses the
//! basis-to-points construction: for each quad build the matrix that sends
//! the three homogeneous basis vectors and `(1, 1, 1)` onto its four corners,
//! then compose `target · source⁻¹`. The result is normalized so that
//! `H[2][2] == 1`.
//!
//! Degenerate input (three collinear corners) has no meaningful fallback and
//! is reported as [`HomographyError::DegenerateQuad`]. Callers are expected
//! to prevent it, not to recover from it.

#[cfg(test)]
#[path = "homography_test.rs"]
mod homography_test;

use std::fmt;

use crate::consts::MIN_TRIANGLE_AREA;
use crate::math::{Mat3, Mat3Ext, Mat4, Vec2};

/// Four points ordered top-left, top-right, bottom-right, bottom-left.
pub type Quad = [Vec2; 4];

/// The four point triples of a quad, by index.
const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

/// Which side of the correspondence was at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadRole {
    Source,
    Target,
}

impl fmt::Display for QuadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HomographyError {
    #[error("degenerate {which} quad: three or more corners are collinear")]
    DegenerateQuad { which: QuadRole },
    #[error("homography sends the origin to infinity and cannot be normalized")]
    OriginAtInfinity,
}

impl crate::error::ErrorCode for HomographyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DegenerateQuad { .. } => "E_DEGENERATE_QUAD",
            Self::OriginAtInfinity => "E_ORIGIN_AT_INFINITY",
        }
    }
}

/// Twice the signed area of triangle `abc`.
fn doubled_area(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Smallest |area| over all four corner triples.
#[must_use]
pub fn min_triangle_area(quad: &Quad) -> f64 {
    TRIPLES
        .iter()
        .map(|[a, b, c]| (doubled_area(quad[*a], quad[*b], quad[*c]) * 0.5).abs())
        .fold(f64::INFINITY, f64::min)
}

/// Whether any three corners are collinear within `min_area`, or any corner
/// is not finite.
#[must_use]
pub fn is_degenerate_with(quad: &Quad, min_area: f64) -> bool {
    if !quad.iter().all(|p| p.is_finite()) {
        return true;
    }
    min_triangle_area(quad) < min_area
}

/// [`is_degenerate_with`] at the solver's own tolerance.
#[must_use]
pub fn is_degenerate(quad: &Quad) -> bool {
    is_degenerate_with(quad, MIN_TRIANGLE_AREA)
}

/// Matrix sending the canonical basis points onto `quad`.
///
/// Columns of `M` are the homogeneous first three corners. Solving
/// `M · v = p4` gives the per-column weights, and `M · diag(v)` then maps
/// `(1,0,0)`, `(0,1,0)`, `(0,0,1)` and `(1,1,1)` onto the four corners.
#[must_use]
pub fn basis_to_points(quad: &Quad) -> Option<Mat3> {
    let m = Mat3::from_cols(quad[0].extend(1.0), quad[1].extend(1.0), quad[2].extend(1.0));
    let v = m.try_inverse()? * quad[3].extend(1.0);
    let basis = m * Mat3::from_diagonal(v);
    basis.is_finite().then_some(basis)
}

fn basis_for(quad: &Quad, which: QuadRole) -> Result<Mat3, HomographyError> {
    if is_degenerate(quad) {
        return Err(HomographyError::DegenerateQuad { which });
    }
    basis_to_points(quad).ok_or(HomographyError::DegenerateQuad { which })
}

/// Projective matrix `H` with `H · source[i] ~ target[i]` for every corner.
///
/// # Errors
///
/// Returns `DegenerateQuad` if either quad has three collinear corners, and
/// `OriginAtInfinity` if the result cannot be normalized.
pub fn compute_homography(source: &Quad, target: &Quad) -> Result<Mat3, HomographyError> {
    let bs = basis_for(source, QuadRole::Source)?;
    let bd = basis_for(target, QuadRole::Target)?;
    let bs_inv = bs
        .try_inverse()
        .ok_or(HomographyError::DegenerateQuad { which: QuadRole::Source })?;
    (bd * bs_inv).normalized().ok_or(HomographyError::OriginAtInfinity)
}

/// [`compute_homography`] plus its 4x4 GL lift.
///
/// # Errors
///
/// Same as [`compute_homography`].
pub fn compute_homography4(source: &Quad, target: &Quad) -> Result<(Mat3, Mat4), HomographyError> {
    let h = compute_homography(source, target)?;
    Ok((h, h.lift_to_mat4()))
}
