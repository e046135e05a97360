//! Shared numeric constants for the keystone crate.

// ── Numerics ────────────────────────────────────────────────────

/// Determinants and homogeneous `w` values below this are treated as zero.
pub const MATRIX_EPSILON: f64 = 1e-12;

/// Minimum |signed area| of any point triple before a quad counts as degenerate.
pub const MIN_TRIANGLE_AREA: f64 = 1e-10;

/// Minimum triangle area, in GL units², accepted between projector handles.
///
/// Much larger than [`MIN_TRIANGLE_AREA`] so a handle drag is stopped well
/// before the homography becomes ill-conditioned.
pub const PROJECTOR_MIN_TRIANGLE_AREA: f64 = 1e-3;

// ── Scene defaults ──────────────────────────────────────────────

/// Default canvas width in canvas units.
pub const DEFAULT_CANVAS_WIDTH: f64 = 60.0;

/// Default canvas height in canvas units.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 40.0;

/// Default projector handle magnitude: handles start at (±0.95, ±0.95).
pub const DEFAULT_PROJECTOR_INSET: f64 = 0.95;

/// Opacity ceiling for layers while the canvas itself is being edited.
pub const CANVAS_EDIT_LAYER_OPACITY: f64 = 0.4;

// ── Handles ─────────────────────────────────────────────────────

/// Screen-space hit radius in pixels for drag handles.
pub const DEFAULT_HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance of move/scale/rotate handles from the layer center, as a
/// fraction of the canvas's shorter side.
pub const HANDLE_REACH_FRACTION: f64 = 0.25;

// ── Runtime ─────────────────────────────────────────────────────

/// Default capacity of the editor task's command queue.
pub const DEFAULT_ACTOR_QUEUE: usize = 64;
