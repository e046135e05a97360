//! Concrete handle kinds and the gestures they drive.
//!
//! Each handle kind is a [`HandleSpec`] (where it sits and in which space it
//! reports drag points) plus a [`Gesture`] that turns those points into
//! [`Effect`]s. Layer handles all work in canvas space; projector corners
//! work in GL space, clamped to the viewport.
//!
//! Layer edits carry a per-gesture batch token, so one drag is one undo
//! step, and the gesture's end finishes the batch. Projector edits bypass
//! history entirely.

#[cfg(test)]
#[path = "handles_test.rs"]
mod handles_test;

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use crate::consts::{HANDLE_REACH_FRACTION, MATRIX_EPSILON};
use crate::coords::Space;
use crate::drag::{Clamp, HandleSpec};
use crate::math::{Vec2, Vec2Ext};
use crate::projection::Projection;
use crate::reducer::Action;
use crate::scene::{EditMode, Layer, LayerId, LayerPatch, Scene};

pub const TOKEN_POSITION: &str = "drag:position";
pub const TOKEN_SCALE: &str = "drag:scale";
pub const TOKEN_ROTATE: &str = "drag:rotate";

const MOVE_AXES: u8 = 4;
const SCALE_AXES: u8 = 3;

/// Every draggable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Free move of the selected layer.
    MoveCenter,
    /// Axis-locked move; axis `a` points along +x rotated by `a · 90°`.
    MoveAxis(u8),
    /// Scale along the layer's x (0), both (1) or y (2) axis.
    Scale(u8),
    Rotate,
    /// Projector distortion corner, in quad order.
    ProjectorCorner(usize),
}

impl HandleKind {
    /// Whether drags of this kind are recorded in undo history.
    #[must_use]
    pub fn is_history_bound(self) -> bool {
        !matches!(self, Self::ProjectorCorner(_))
    }
}

/// What a gesture asks the editor to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Dispatch(Action),
    FinishBatch,
    SetProjectorHandle { index: usize, point: Vec2 },
}

/// Distance of layer handles from the layer center, in canvas units.
#[must_use]
pub fn handle_reach(canvas_size: Vec2) -> f64 {
    canvas_size.min_element() * HANDLE_REACH_FRACTION
}

fn layer_handle_origin(kind: HandleKind, layer: &Layer, reach: f64) -> Option<Vec2> {
    let t = layer.translation;
    match kind {
        HandleKind::MoveCenter => Some(t),
        HandleKind::MoveAxis(axis) if axis < MOVE_AXES => {
            Some(t + Vec2::X.rotate_around(Vec2::ZERO, FRAC_PI_2 * f64::from(axis)) * reach)
        }
        HandleKind::Scale(axis) if axis < SCALE_AXES => {
            let dir = Vec2::X.rotate_around(Vec2::ZERO, FRAC_PI_4 * f64::from(axis) + layer.rotation);
            Some(t + dir * reach)
        }
        HandleKind::Rotate => Some(t + Vec2::new(0.0, -reach).rotate_around(Vec2::ZERO, layer.rotation)),
        _ => None,
    }
}

/// The spec for one handle, or `None` if it does not currently exist.
#[must_use]
pub fn handle_spec(kind: HandleKind, scene: &Scene, projection: &Projection) -> Option<HandleSpec> {
    if let HandleKind::ProjectorCorner(index) = kind {
        let origin = projection.handle(index)?;
        return Some(HandleSpec::new(origin, Space::Gl).clamped(Clamp::UnitSquare));
    }
    let layer = scene.selected_layer()?;
    let origin = layer_handle_origin(kind, layer, handle_reach(scene.canvas.size))?;
    Some(HandleSpec::new(origin, Space::Canvas))
}

/// The handles to show for the current selection and edit mode.
///
/// While the canvas is selected only the projector corners are active.
#[must_use]
pub fn handles_for(scene: &Scene, projection: &Projection) -> Vec<(HandleKind, HandleSpec)> {
    let kinds: Vec<HandleKind> = if scene.canvas.selected {
        (0..projection.handles.len()).map(HandleKind::ProjectorCorner).collect()
    } else if scene.selected_layer().is_some() {
        match scene.edit_mode {
            EditMode::None => Vec::new(),
            EditMode::Move => {
                std::iter::once(HandleKind::MoveCenter).chain((0..MOVE_AXES).map(HandleKind::MoveAxis)).collect()
            }
            EditMode::Scale => (0..SCALE_AXES).map(HandleKind::Scale).collect(),
            EditMode::Rotate => vec![HandleKind::Rotate],
        }
    } else {
        Vec::new()
    };
    kinds.into_iter().filter_map(|kind| handle_spec(kind, scene, projection).map(|spec| (kind, spec))).collect()
}

/// Per-drag context captured at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Move {
        layer: LayerId,
        /// Pointer minus translation at drag start.
        offset: Vec2,
        /// Translation at drag start.
        origin: Vec2,
        axis: Option<u8>,
    },
    Scale {
        layer: LayerId,
        center: Vec2,
        /// Pointer relative to `center` at drag start.
        start: Vec2,
        /// Scale at drag start.
        scale0: Vec2,
        axis: u8,
    },
    Rotate {
        layer: LayerId,
        center: Vec2,
    },
    Projector {
        index: usize,
    },
}

impl Gesture {
    /// Capture the context for a drag of `kind` starting at `point` (in the
    /// handle's space). `None` if the handle has nothing to act on.
    #[must_use]
    pub fn begin(kind: HandleKind, scene: &Scene, point: Vec2) -> Option<Self> {
        if let HandleKind::ProjectorCorner(index) = kind {
            return Some(Self::Projector { index });
        }
        let layer = scene.selected_layer()?;
        let center = layer.translation;
        match kind {
            HandleKind::MoveCenter => Some(Self::Move { layer: layer.id, offset: point - center, origin: center, axis: None }),
            HandleKind::MoveAxis(axis) if axis < MOVE_AXES => {
                Some(Self::Move { layer: layer.id, offset: point - center, origin: center, axis: Some(axis) })
            }
            HandleKind::Scale(axis) if axis < SCALE_AXES => {
                let start = point - center;
                if start.length() < MATRIX_EPSILON {
                    return None;
                }
                Some(Self::Scale { layer: layer.id, center, start, scale0: layer.scale, axis })
            }
            HandleKind::Rotate => Some(Self::Rotate { layer: layer.id, center }),
            _ => None,
        }
    }

    /// The effect of the pointer reaching `point`, or `None` if there is
    /// nothing to do for it.
    #[must_use]
    pub fn update(&self, point: Vec2) -> Option<Effect> {
        match *self {
            Self::Move { layer, offset, origin, axis } => {
                let mut pos = point - offset;
                match axis {
                    Some(a) if a & 1 == 1 => pos.x = origin.x,
                    Some(_) => pos.y = origin.y,
                    None => {}
                }
                Some(dispatch(layer, LayerPatch::translation(pos), TOKEN_POSITION))
            }
            Self::Scale { layer, center, start, scale0, axis } => {
                let rel = point - center;
                let sign = if start.dot(rel) >= 0.0 { 1.0 } else { -1.0 };
                let mut scale = scale0 / start.length() * rel.length() * sign;
                match axis {
                    0 => scale.y = scale0.y,
                    2 => scale.x = scale0.x,
                    _ => {}
                }
                Some(dispatch(layer, LayerPatch::scale(scale), TOKEN_SCALE))
            }
            Self::Rotate { layer, center } => {
                let d = point - center;
                if d == Vec2::ZERO {
                    return None;
                }
                let rotation = (d.y.atan2(d.x) + FRAC_PI_2).rem_euclid(TAU);
                Some(dispatch(layer, LayerPatch::rotation(rotation), TOKEN_ROTATE))
            }
            Self::Projector { index } => Some(Effect::SetProjectorHandle { index, point }),
        }
    }

    /// The effect of releasing the drag.
    #[must_use]
    pub fn end(&self) -> Option<Effect> {
        match self {
            Self::Projector { .. } => None,
            _ => Some(Effect::FinishBatch),
        }
    }
}

fn dispatch(layer: LayerId, props: LayerPatch, token: &'static str) -> Effect {
    Effect::Dispatch(Action::update_layer(layer, props).batched(token))
}
