//! Coordinate-space pipeline.
//!
//! Four spaces are in play:
//!
//! | space    | units                      | origin / orientation           |
//! |----------|----------------------------|--------------------------------|
//! | client   | device pixels              | page top-left, y down          |
//! | viewport | device pixels              | viewport top-left, y down      |
//! | GL       | `[-1, 1]²`                 | viewport center, y up          |
//! | canvas   | canvas units               | canvas center, y up            |
//!
//! Client to viewport is a plain offset ([`ViewportRect::to_local`]). The
//! other links are 3x3 matrices collected in [`FrameMatrices`], recomputed
//! from scratch every frame so they never go stale against the layout or the
//! projector handles. Canvas to GL is the keystone homography from the canvas
//! corners onto the projector handles.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use serde::{Deserialize, Serialize};

use crate::homography::{HomographyError, Quad, compute_homography, compute_homography4};
use crate::math::{Mat3, Mat3Ext, Mat4, Vec2};
use crate::projection::Projection;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordsError {
    #[error(transparent)]
    Homography(#[from] HomographyError),
    #[error("viewport has no area: {width}x{height}")]
    EmptyViewport { width: f64, height: f64 },
}

impl crate::error::ErrorCode for CoordsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Homography(e) => e.error_code(),
            Self::EmptyViewport { .. } => "E_EMPTY_VIEWPORT",
        }
    }
}

/// The on-screen rectangle the projector preview is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, width: 1.0, height: 1.0 }
    }
}

impl ViewportRect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Client (page) pixels to viewport-local pixels.
    #[must_use]
    pub fn to_local(&self, client: Vec2) -> Vec2 {
        client - Vec2::new(self.left, self.top)
    }

    /// Viewport-local pixels back to client pixels.
    #[must_use]
    pub fn to_client(&self, local: Vec2) -> Vec2 {
        local + Vec2::new(self.left, self.top)
    }

    /// GL `[-1, 1]²` (y up) to viewport pixels (y down).
    #[must_use]
    pub fn gl_to_viewport(&self) -> Mat3 {
        let (hw, hh) = (self.width * 0.5, self.height * 0.5);
        Mat3::from_rows([[hw, 0.0, hw], [0.0, -hh, hh], [0.0, 0.0, 1.0]])
    }

    fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A space a point or handle can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    Viewport,
    Gl,
    Canvas,
}

/// Canvas corners in quad order for a canvas of `size`, centered on the origin.
#[must_use]
pub fn canvas_quad(size: Vec2) -> Quad {
    let h = size * 0.5;
    [Vec2::new(-h.x, h.y), Vec2::new(h.x, h.y), Vec2::new(h.x, -h.y), Vec2::new(-h.x, -h.y)]
}

/// Every matrix needed to draw and hit-test one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub viewport: ViewportRect,
    pub gl_to_viewport: Mat3,
    pub viewport_to_gl: Mat3,
    pub canvas_to_gl: Mat3,
    pub gl_to_canvas: Mat3,
    pub canvas_to_viewport: Mat3,
    pub viewport_to_canvas: Mat3,
    /// `canvas_to_gl` lifted for the GL renderer.
    pub projector_matrix4: Mat4,
}

impl FrameMatrices {
    /// Build the frame for the current layout, canvas and projector handles.
    ///
    /// # Errors
    ///
    /// `EmptyViewport` if the viewport has no area, `Homography` if the
    /// canvas or the projector quad is degenerate.
    pub fn compute(viewport: ViewportRect, canvas_size: Vec2, projection: &Projection) -> Result<Self, CoordsError> {
        if !viewport.has_area() {
            return Err(CoordsError::EmptyViewport { width: viewport.width, height: viewport.height });
        }
        let gl_to_viewport = viewport.gl_to_viewport();
        let viewport_to_gl = gl_to_viewport
            .try_inverse()
            .ok_or(CoordsError::EmptyViewport { width: viewport.width, height: viewport.height })?;

        let corners = canvas_quad(canvas_size);
        let (canvas_to_gl, projector_matrix4) = compute_homography4(&corners, &projection.handles)?;
        let gl_to_canvas = compute_homography(&projection.handles, &corners)?;

        Ok(Self {
            viewport,
            gl_to_viewport,
            viewport_to_gl,
            canvas_to_gl,
            gl_to_canvas,
            canvas_to_viewport: gl_to_viewport * canvas_to_gl,
            viewport_to_canvas: gl_to_canvas * viewport_to_gl,
            projector_matrix4,
        })
    }

    /// Matrix drawing points of `space` into viewport pixels.
    #[must_use]
    pub fn to_viewport(&self, space: Space) -> Mat3 {
        match space {
            Space::Viewport => Mat3::IDENTITY,
            Space::Gl => self.gl_to_viewport,
            Space::Canvas => self.canvas_to_viewport,
        }
    }

    /// Inverse of [`to_viewport`](Self::to_viewport) for the same space.
    #[must_use]
    pub fn from_viewport(&self, space: Space) -> Mat3 {
        match space {
            Space::Viewport => Mat3::IDENTITY,
            Space::Gl => self.viewport_to_gl,
            Space::Canvas => self.viewport_to_canvas,
        }
    }

    /// A client-pixel point expressed in `space`, or `None` if it maps to
    /// infinity (beyond the projector's horizon).
    #[must_use]
    pub fn client_to_space(&self, client: Vec2, space: Space) -> Option<Vec2> {
        self.from_viewport(space).project_point(self.viewport.to_local(client))
    }

    /// A point in `space` drawn in viewport pixels.
    #[must_use]
    pub fn space_to_viewport(&self, point: Vec2, space: Space) -> Option<Vec2> {
        self.to_viewport(space).project_point(point)
    }

    /// A point in `space` drawn in client pixels.
    #[must_use]
    pub fn space_to_client(&self, point: Vec2, space: Space) -> Option<Vec2> {
        self.space_to_viewport(point, space).map(|p| self.viewport.to_client(p))
    }
}
