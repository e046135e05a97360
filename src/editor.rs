//! Editor instance: one owned state value and its entry points.
//!
//! DESIGN
//! ======
//! An [`Editor`] is created when the editor opens and dropped when it
//! closes. It owns the undo history around the scene reducer, the projector
//! handles, the viewport layout, the drag machine with its active gesture,
//! and the redraw scheduler. Nothing is shared; every mutation goes through
//! `&mut self`, so dispatches cannot interleave.
//!
//! Hosts drive it with:
//!
//! - [`Command`]s from the UI collaborator (scene actions plus the
//!   `history:*` commands);
//! - pointer events, either against a known handle
//!   ([`Editor::pointer_down`]) or hit-tested ([`Editor::pointer_down_at`]);
//! - layout changes ([`Editor::set_viewport`]) and decoded images
//!   ([`Editor::on_image_decoded`]).
//!
//! Every state change requests a redraw. The host polls
//! [`Editor::take_redraw`] on its animation frame and, if it returns `true`,
//! draws [`Editor::render_inputs`].

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::coords::{FrameMatrices, ViewportRect};
use crate::drag::{DragMachine, DragTransition, HandleSpec, PointerEvent};
use crate::error::EditorError;
use crate::handles::{Effect, Gesture, HandleKind, handle_spec, handles_for};
use crate::history::{History, HistoryConfig, Recorded};
use crate::math::{Mat3, Mat4, Vec2};
use crate::projection::{Projection, ProjectionError};
use crate::reducer::{Action, ActionKind, SceneError, SceneReducer};
use crate::redraw::RedrawScheduler;
use crate::scene::{Canvas, ImageRef, LayerId, Scene};

// =============================================================================
// TYPES
// =============================================================================

/// Everything the UI collaborator can ask of the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Action),
    Undo,
    Redo,
    FinishBatch,
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        Self::Dispatch(action)
    }
}

impl Command {
    /// Parse a command object: one of the `history:*` types, or a scene
    /// action.
    ///
    /// # Errors
    ///
    /// Same as [`Action::from_json`].
    pub fn from_json(value: &Value) -> Result<Self, SceneError> {
        match value.get("type").and_then(Value::as_str) {
            Some("history:undo") => Ok(Self::Undo),
            Some("history:redo") => Ok(Self::Redo),
            Some("history:finishBatch") => Ok(Self::FinishBatch),
            _ => Action::from_json(value).map(Self::Dispatch),
        }
    }
}

/// A pointer event routed to the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Pointer pressed on a known handle.
    Down { kind: HandleKind, event: PointerEvent },
    /// Pointer pressed somewhere; the editor finds the handle.
    DownAt(PointerEvent),
    Move(PointerEvent),
    Up(PointerEvent),
    Cancel(PointerEvent),
}

/// One layer as the renderer draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    pub id: LayerId,
    pub image: ImageRef,
    pub size: Vec2,
    /// Layer-local pixels to canvas space.
    pub model_matrix: Mat3,
    pub opacity: f64,
}

/// What the external renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInputs {
    pub canvas: Canvas,
    /// Paint order, bottom first.
    pub layers: Vec<RenderLayer>,
    pub projector_matrix4: Mat4,
    pub viewport: ViewportRect,
}

pub struct Editor {
    history: History<SceneReducer>,
    projection: Projection,
    viewport: ViewportRect,
    drag: DragMachine,
    gesture: Option<Gesture>,
    redraw: RedrawScheduler,
    handle_radius_px: f64,
}

// =============================================================================
// CONSTRUCTION AND QUERIES
// =============================================================================

impl Editor {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        let history_config = HistoryConfig::ignoring(ActionKind::transient()).with_limit(config.history_limit);
        Self {
            history: History::new(SceneReducer, Scene::new(config.canvas_size), history_config),
            projection: Projection::inset(config.projector_inset),
            viewport: ViewportRect::default(),
            drag: DragMachine::new(),
            gesture: None,
            redraw: RedrawScheduler::new(),
            handle_radius_px: config.handle_radius_px,
        }
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.history.present()
    }

    #[must_use]
    pub fn history(&self) -> &History<SceneReducer> {
        &self.history
    }

    #[must_use]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[must_use]
    pub fn viewport(&self) -> ViewportRect {
        self.viewport
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Matrices for the current layout, canvas and projector.
    ///
    /// # Errors
    ///
    /// See [`FrameMatrices::compute`].
    pub fn frame(&self) -> Result<FrameMatrices, EditorError> {
        Ok(FrameMatrices::compute(self.viewport, self.scene().canvas.size, &self.projection)?)
    }

    /// Inputs for the renderer.
    ///
    /// # Errors
    ///
    /// See [`FrameMatrices::compute`].
    pub fn render_inputs(&self) -> Result<RenderInputs, EditorError> {
        let frame = self.frame()?;
        let scene = self.scene();
        let layers = scene
            .layers
            .iter()
            .map(|l| RenderLayer {
                id: l.id,
                image: l.image.clone(),
                size: l.size,
                model_matrix: l.model_matrix(),
                opacity: l.display_opacity(scene.canvas.selected),
            })
            .collect();
        Ok(RenderInputs {
            canvas: scene.canvas.clone(),
            layers,
            projector_matrix4: frame.projector_matrix4,
            viewport: self.viewport,
        })
    }

    /// Currently active handles.
    #[must_use]
    pub fn handles(&self) -> Vec<(HandleKind, HandleSpec)> {
        handles_for(self.scene(), &self.projection)
    }

    /// Consume the pending redraw, if any. Call once per animation frame.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take_frame()
    }

    #[must_use]
    pub fn redraw_pending(&self) -> bool {
        self.redraw.is_pending()
    }

    fn request_redraw(&mut self) {
        if self.redraw.request() {
            debug!("redraw scheduled");
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

impl Editor {
    /// Run one command. Returns whether the scene changed.
    ///
    /// # Errors
    ///
    /// Reducer errors; the scene and history are unchanged in that case.
    pub fn apply(&mut self, command: Command) -> Result<bool, EditorError> {
        let changed = match command {
            Command::Dispatch(action) => {
                let recorded = self.history.dispatch(&action)?;
                debug!(kind = action.op.kind().as_str(), ?recorded, "scene action applied");
                true
            }
            Command::Undo => self.history.undo(),
            Command::Redo => self.history.redo(),
            Command::FinishBatch => {
                self.history.finish_batch();
                false
            }
        };
        if changed {
            self.request_redraw();
        }
        Ok(changed)
    }

    /// [`apply`](Self::apply) for a single action.
    ///
    /// # Errors
    ///
    /// Reducer errors.
    pub fn dispatch(&mut self, action: Action) -> Result<Recorded, EditorError> {
        let recorded = self.history.dispatch(&action)?;
        self.request_redraw();
        Ok(recorded)
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo();
        if changed {
            self.request_redraw();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo();
        if changed {
            self.request_redraw();
        }
        changed
    }

    pub fn finish_batch(&mut self) {
        self.history.finish_batch();
    }

    /// Import completion: add the decoded image as a new selected layer.
    ///
    /// # Errors
    ///
    /// `InvalidImageSize` for a non-positive or non-finite size.
    pub fn on_image_decoded(&mut self, data_url: impl Into<ImageRef>, width: f64, height: f64) -> Result<LayerId, EditorError> {
        let id = self.scene().next_layer_id;
        self.dispatch(Action::add_layer_by_data_url(data_url, width, height))?;
        info!(layer = id, width, height, "image layer added");
        Ok(id)
    }

    /// Update the layout rectangle. Returns whether it changed.
    pub fn set_viewport(&mut self, rect: ViewportRect) -> bool {
        if rect == self.viewport {
            return false;
        }
        self.viewport = rect;
        self.request_redraw();
        true
    }

    /// Move one projector handle.
    ///
    /// # Errors
    ///
    /// `HandleIndex` or `Degenerate`; the projection is unchanged then.
    pub fn set_projector_handle(&mut self, index: usize, point: Vec2) -> Result<(), EditorError> {
        self.projection = self.projection.with_handle(index, point)?;
        self.request_redraw();
        Ok(())
    }
}

// =============================================================================
// POINTER
// =============================================================================

impl Editor {
    /// Start dragging handle `kind`. Returns whether a drag started.
    ///
    /// # Errors
    ///
    /// Fails only if the frame cannot be computed.
    pub fn pointer_down(&mut self, kind: HandleKind, ev: PointerEvent) -> Result<bool, EditorError> {
        let Some(spec) = handle_spec(kind, self.scene(), &self.projection) else {
            return Ok(false);
        };
        let frame = self.frame()?;
        let DragTransition::Started(point) = self.drag.pointer_down(ev, &spec, &frame) else {
            return Ok(false);
        };
        match Gesture::begin(kind, self.scene(), point) {
            Some(gesture) => {
                debug!(?kind, pointer = ev.pointer_id, "drag started");
                self.gesture = Some(gesture);
                Ok(true)
            }
            None => {
                self.drag.pointer_cancel(ev);
                Ok(false)
            }
        }
    }

    /// Hit-test the active handles and start dragging the one under the
    /// pointer. Later handles are drawn on top and win ties.
    ///
    /// # Errors
    ///
    /// Fails only if the frame cannot be computed.
    pub fn pointer_down_at(&mut self, ev: PointerEvent) -> Result<Option<HandleKind>, EditorError> {
        let frame = self.frame()?;
        let hit = self
            .handles()
            .into_iter()
            .rev()
            .find(|(_, spec)| spec.hit(&frame, ev.client, self.handle_radius_px))
            .map(|(kind, _)| kind);
        let Some(kind) = hit else {
            return Ok(None);
        };
        Ok(self.pointer_down(kind, ev)?.then_some(kind))
    }

    /// Returns whether the move changed any state.
    ///
    /// # Errors
    ///
    /// Reducer errors from the resulting edit.
    pub fn pointer_move(&mut self, ev: PointerEvent) -> Result<bool, EditorError> {
        if !self.drag.is_listening() {
            return Ok(false);
        }
        let frame = self.frame()?;
        let DragTransition::Moved(point) = self.drag.pointer_move(ev, &frame) else {
            return Ok(false);
        };
        let Some(effect) = self.gesture.and_then(|g| g.update(point)) else {
            return Ok(false);
        };
        self.run_effect(effect)
    }

    /// Release the drag. Returns whether a drag ended.
    ///
    /// # Errors
    ///
    /// Never in practice; finishing a batch cannot fail.
    pub fn pointer_up(&mut self, ev: PointerEvent) -> Result<bool, EditorError> {
        if self.drag.pointer_up(ev) != DragTransition::Ended {
            return Ok(false);
        }
        self.end_gesture()?;
        Ok(true)
    }

    /// Abort the drag. Edits already made by it stay; only the batch is
    /// finished.
    ///
    /// # Errors
    ///
    /// Same as [`pointer_up`](Self::pointer_up).
    pub fn pointer_cancel(&mut self, ev: PointerEvent) -> Result<bool, EditorError> {
        if self.drag.pointer_cancel(ev) != DragTransition::Ended {
            return Ok(false);
        }
        debug!(pointer = ev.pointer_id, "drag cancelled");
        self.end_gesture()?;
        Ok(true)
    }

    /// Route any pointer input. Returns whether it had an effect.
    ///
    /// # Errors
    ///
    /// Same as the specific entry points.
    pub fn pointer(&mut self, input: PointerInput) -> Result<bool, EditorError> {
        match input {
            PointerInput::Down { kind, event } => self.pointer_down(kind, event),
            PointerInput::DownAt(event) => Ok(self.pointer_down_at(event)?.is_some()),
            PointerInput::Move(event) => self.pointer_move(event),
            PointerInput::Up(event) => self.pointer_up(event),
            PointerInput::Cancel(event) => self.pointer_cancel(event),
        }
    }

    fn end_gesture(&mut self) -> Result<(), EditorError> {
        if let Some(effect) = self.gesture.take().and_then(|g| g.end()) {
            self.run_effect(effect)?;
        }
        debug!("drag ended");
        Ok(())
    }

    fn run_effect(&mut self, effect: Effect) -> Result<bool, EditorError> {
        match effect {
            Effect::Dispatch(action) => self.apply(Command::Dispatch(action)),
            Effect::FinishBatch => self.apply(Command::FinishBatch),
            Effect::SetProjectorHandle { index, point } => match self.projection.with_handle(index, point) {
                Ok(projection) => {
                    self.projection = projection;
                    self.request_redraw();
                    Ok(true)
                }
                Err(ProjectionError::Degenerate { .. }) => {
                    warn!(index, x = point.x, y = point.y, "projector handle move rejected: quad would collapse");
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}
