//! Drag-handle state machine.
//!
//! One generic machine serves every handle kind. A handle is described by a
//! [`HandleSpec`]: where it sits, which [`Space`] its drag points are
//! reported in, and whether they are clamped. The machine turns raw pointer
//! events into `Started` / `Moved` / `Ended` transitions carrying points in
//! that space; what a drag *means* is decided by the caller.
//!
//! Only one drag runs at a time. While a drag is active the host must route
//! global pointer-move/up/cancel events here ([`DragMachine::is_listening`]);
//! every exit path returns the machine to idle, so listeners can be dropped.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use serde::{Deserialize, Serialize};

use crate::coords::{FrameMatrices, Space};
use crate::math::{Vec2, Vec2Ext};

/// A pointer event in client (page) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    pub pointer_id: i32,
    pub client: Vec2,
}

impl PointerEvent {
    #[must_use]
    pub fn new(pointer_id: i32, x: f64, y: f64) -> Self {
        Self { pointer_id, client: Vec2::new(x, y) }
    }
}

/// Post-processing applied to every drag point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clamp {
    #[default]
    None,
    /// Clamp to `[-1, 1]²`, the GL viewport.
    UnitSquare,
}

impl Clamp {
    #[must_use]
    pub fn apply(self, p: Vec2) -> Vec2 {
        match self {
            Self::None => p,
            Self::UnitSquare => p.clamp_to_unit_square(),
        }
    }
}

/// Capability record configuring the machine for one handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleSpec {
    /// Handle position, in `space`.
    pub origin: Vec2,
    pub space: Space,
    pub clamp: Clamp,
}

impl HandleSpec {
    #[must_use]
    pub fn new(origin: Vec2, space: Space) -> Self {
        Self { origin, space, clamp: Clamp::None }
    }

    #[must_use]
    pub fn clamped(mut self, clamp: Clamp) -> Self {
        self.clamp = clamp;
        self
    }

    /// Where to draw the handle, in client pixels.
    #[must_use]
    pub fn screen_position(&self, frame: &FrameMatrices) -> Option<Vec2> {
        frame.space_to_client(self.origin, self.space)
    }

    /// Whether `client` is within `radius` pixels of the drawn handle.
    #[must_use]
    pub fn hit(&self, frame: &FrameMatrices, client: Vec2, radius: f64) -> bool {
        self.screen_position(frame).is_some_and(|p| p.distance(client) <= radius)
    }

    /// A client point expressed in this handle's space, clamped.
    #[must_use]
    pub fn pointer_to_local(&self, frame: &FrameMatrices, client: Vec2) -> Option<Vec2> {
        frame.client_to_space(client, self.space).map(|p| self.clamp.apply(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { pointer_id: i32, space: Space, clamp: Clamp },
}

/// Result of feeding one pointer event to the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragTransition {
    /// A drag began; the point is in the handle's space.
    Started(Vec2),
    Moved(Vec2),
    Ended,
    /// The event did not apply: wrong pointer, no drag running, a drag
    /// already running, or the point is beyond the projector horizon.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct DragMachine {
    state: DragState,
}

impl DragMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Whether global move/up/cancel listeners should be registered.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.is_dragging()
    }

    pub fn pointer_down(&mut self, ev: PointerEvent, spec: &HandleSpec, frame: &FrameMatrices) -> DragTransition {
        if self.is_dragging() {
            return DragTransition::Ignored;
        }
        let Some(point) = spec.pointer_to_local(frame, ev.client) else {
            return DragTransition::Ignored;
        };
        self.state = DragState::Dragging { pointer_id: ev.pointer_id, space: spec.space, clamp: spec.clamp };
        DragTransition::Started(point)
    }

    pub fn pointer_move(&mut self, ev: PointerEvent, frame: &FrameMatrices) -> DragTransition {
        let DragState::Dragging { pointer_id, space, clamp } = self.state else {
            return DragTransition::Ignored;
        };
        if pointer_id != ev.pointer_id {
            return DragTransition::Ignored;
        }
        match frame.client_to_space(ev.client, space) {
            Some(p) => DragTransition::Moved(clamp.apply(p)),
            None => DragTransition::Ignored,
        }
    }

    pub fn pointer_up(&mut self, ev: PointerEvent) -> DragTransition {
        self.release(ev.pointer_id)
    }

    /// Same as [`pointer_up`](Self::pointer_up): the drag ends where it is.
    pub fn pointer_cancel(&mut self, ev: PointerEvent) -> DragTransition {
        self.release(ev.pointer_id)
    }

    fn release(&mut self, id: i32) -> DragTransition {
        match self.state {
            DragState::Dragging { pointer_id, .. } if pointer_id == id => {
                self.state = DragState::Idle;
                DragTransition::Ended
            }
            _ => DragTransition::Ignored,
        }
    }
}
