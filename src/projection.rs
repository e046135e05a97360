//! Projector distortion handles.
//!
//! The projection is four handle points in GL space ([-1, 1]²), ordered like
//! a [`Quad`]. The canvas corners are mapped onto them to preview keystone
//! distortion. Edits go through [`Projection::with_handle`], which clamps the
//! moved handle to the unit square and refuses any configuration where three
//! handles become (nearly) collinear, so the homography built from it is
//! always well-conditioned.
//!
//! Projection state lives beside the scene history, not inside it: dragging
//! the projector is calibration, not an undoable document edit.

#[cfg(test)]
#[path = "projection_test.rs"]
mod projection_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PROJECTOR_INSET, PROJECTOR_MIN_TRIANGLE_AREA};
use crate::homography::{Quad, is_degenerate_with};
use crate::math::{Vec2, Vec2Ext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("projector handle index out of range: {0}")]
    HandleIndex(usize),
    #[error("moving projector handle {index} would collapse the projector quad")]
    Degenerate { index: usize },
}

impl crate::error::ErrorCode for ProjectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HandleIndex(_) => "E_HANDLE_INDEX",
            Self::Degenerate { .. } => "E_DEGENERATE_QUAD",
        }
    }
}

/// The projector's four distortion handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub handles: Quad,
}

impl Default for Projection {
    fn default() -> Self {
        Self::inset(DEFAULT_PROJECTOR_INSET)
    }
}

impl Projection {
    /// Handles at `(±o, ±o)`, just inside the natural GL corners.
    #[must_use]
    pub fn inset(o: f64) -> Self {
        Self {
            handles: [Vec2::new(-o, o), Vec2::new(o, o), Vec2::new(o, -o), Vec2::new(-o, -o)],
        }
    }

    /// The handle at `index`, if there is one.
    #[must_use]
    pub fn handle(&self, index: usize) -> Option<Vec2> {
        self.handles.get(index).copied()
    }

    /// Whether the handles form a usable (non-collinear) quad.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !is_degenerate_with(&self.handles, PROJECTOR_MIN_TRIANGLE_AREA)
    }

    /// A copy with handle `index` moved to `point`, clamped to [-1, 1]².
    ///
    /// # Errors
    ///
    /// `HandleIndex` for an index outside `0..4`; `Degenerate` if the move
    /// would leave three handles collinear. `self` is never modified.
    pub fn with_handle(&self, index: usize, point: Vec2) -> Result<Self, ProjectionError> {
        if index >= self.handles.len() {
            return Err(ProjectionError::HandleIndex(index));
        }
        let mut handles = self.handles;
        handles[index] = point.clamp_to_unit_square();
        let next = Self { handles };
        if !next.is_valid() {
            return Err(ProjectionError::Degenerate { index });
        }
        Ok(next)
    }
}
