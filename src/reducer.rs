//! Scene reducer: the pure domain-action set.
//!
//! DESIGN
//! ======
//! [`SceneReducer`] maps `(Scene, Action)` to a new `Scene` and never touches
//! its input. Undo/redo is not its business; it is plugged into
//! [`History`](crate::history::History) through the [`Reducer`] trait.
//!
//! Actions arrive from the UI collaborator as JSON objects tagged by
//! `"type"`, optionally carrying a `historyBatchToken`. An unrecognised
//! `type` is a contract violation: [`Action::from_json`] logs it and returns
//! [`SceneError::UnknownAction`] instead of silently dropping it.
//!
//! Every reduction keeps the scene invariants: at most one selected item,
//! and `next_layer_id` above every layer id. Inputs that would break them
//! are rejected with a [`SceneError`].

#[cfg(test)]
#[path = "reducer_test.rs"]
mod reducer_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::history::{BatchToken, HistoryAction, Reducer};
use crate::math::Vec2;
use crate::scene::{CanvasPatch, EditMode, ImageRef, Layer, LayerId, LayerPatch, Scene, Selection};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("unknown scene action: {kind}")]
    UnknownAction { kind: String },
    #[error("malformed scene action: {0}")]
    MalformedAction(#[from] serde_json::Error),
    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),
    #[error("layer id already in use: {0}")]
    DuplicateLayerId(LayerId),
    #[error("layer order must list existing layers at most once")]
    InvalidLayerOrder,
    #[error("invalid image size: {width}x{height}")]
    InvalidImageSize { width: f64, height: f64 },
    #[error("invalid canvas size: {width}x{height}")]
    InvalidCanvasSize { width: f64, height: f64 },
    #[error("non-finite value in update for layer {0}")]
    InvalidLayerPatch(LayerId),
    #[error("layer id {0} leaves no room for a next id")]
    LayerIdExhausted(LayerId),
    #[error("invalid scene: {0}")]
    InvalidScene(&'static str),
}

impl crate::error::ErrorCode for SceneError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "E_UNKNOWN_ACTION",
            Self::MalformedAction(_) => "E_MALFORMED_ACTION",
            Self::LayerNotFound(_) => "E_LAYER_NOT_FOUND",
            Self::DuplicateLayerId(_) => "E_DUPLICATE_LAYER_ID",
            Self::InvalidLayerOrder => "E_INVALID_LAYER_ORDER",
            Self::InvalidImageSize { .. } => "E_INVALID_IMAGE_SIZE",
            Self::InvalidCanvasSize { .. } => "E_INVALID_CANVAS_SIZE",
            Self::InvalidLayerPatch(_) => "E_INVALID_LAYER_PATCH",
            Self::LayerIdExhausted(_) => "E_LAYER_ID_EXHAUSTED",
            Self::InvalidScene(_) => "E_INVALID_SCENE",
        }
    }
}

/// The scene operations, in the wire shape used by the UI collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SceneOp {
    /// Replace the whole scene. The new scene must already satisfy the
    /// selection and id invariants.
    Set { state: Box<Scene> },
    SetEditMode { edit_mode: EditMode },
    UpdateCanvas { props: CanvasPatch },
    /// Append a fully-formed layer.
    AddLayer { layer: Layer },
    /// Append a new layer fitted to the canvas, selected. The thumbnail
    /// falls back to the data URL.
    #[serde(rename = "addLayerByDataURL")]
    AddLayerByDataUrl {
        data_url: ImageRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thumbnail_image: Option<ImageRef>,
        width: f64,
        height: f64,
    },
    /// Select the canvas or a layer; `null` deselects everything.
    SelectLayer {
        #[serde(default)]
        layer: Option<Selection>,
    },
    UpdateLayer { layer: LayerId, props: LayerPatch },
    /// Replace the layer list with these ids, in order. Leaving an id out
    /// deletes that layer.
    ReorderLayers { layers: Vec<LayerId> },
}

/// Fieldless mirror of [`SceneOp`], used for history ignore sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Set,
    SetEditMode,
    UpdateCanvas,
    AddLayer,
    AddLayerByDataUrl,
    SelectLayer,
    UpdateLayer,
    ReorderLayers,
}

impl ActionKind {
    pub const ALL: [Self; 8] = [
        Self::Set,
        Self::SetEditMode,
        Self::UpdateCanvas,
        Self::AddLayer,
        Self::AddLayerByDataUrl,
        Self::SelectLayer,
        Self::UpdateLayer,
        Self::ReorderLayers,
    ];

    /// The `"type"` tag on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::SetEditMode => "setEditMode",
            Self::UpdateCanvas => "updateCanvas",
            Self::AddLayer => "addLayer",
            Self::AddLayerByDataUrl => "addLayerByDataURL",
            Self::SelectLayer => "selectLayer",
            Self::UpdateLayer => "updateLayer",
            Self::ReorderLayers => "reorderLayers",
        }
    }

    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    /// Kinds that only change transient UI state and bypass undo history.
    #[must_use]
    pub fn transient() -> [Self; 2] {
        [Self::SelectLayer, Self::SetEditMode]
    }
}

impl SceneOp {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Set { .. } => ActionKind::Set,
            Self::SetEditMode { .. } => ActionKind::SetEditMode,
            Self::UpdateCanvas { .. } => ActionKind::UpdateCanvas,
            Self::AddLayer { .. } => ActionKind::AddLayer,
            Self::AddLayerByDataUrl { .. } => ActionKind::AddLayerByDataUrl,
            Self::SelectLayer { .. } => ActionKind::SelectLayer,
            Self::UpdateLayer { .. } => ActionKind::UpdateLayer,
            Self::ReorderLayers { .. } => ActionKind::ReorderLayers,
        }
    }
}

/// A scene operation plus its optional history batch token.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub op: SceneOp,
    pub batch_token: Option<BatchToken>,
}

impl From<SceneOp> for Action {
    fn from(op: SceneOp) -> Self {
        Self::new(op)
    }
}

impl HistoryAction for Action {
    type Kind = ActionKind;

    fn kind(&self) -> ActionKind {
        self.op.kind()
    }

    fn batch_token(&self) -> Option<&BatchToken> {
        self.batch_token.as_ref()
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl Action {
    #[must_use]
    pub fn new(op: SceneOp) -> Self {
        Self { op, batch_token: None }
    }

    #[must_use]
    pub fn batched(mut self, token: impl Into<BatchToken>) -> Self {
        self.batch_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn select(item: Option<Selection>) -> Self {
        Self::new(SceneOp::SelectLayer { layer: item })
    }

    #[must_use]
    pub fn set_edit_mode(edit_mode: EditMode) -> Self {
        Self::new(SceneOp::SetEditMode { edit_mode })
    }

    #[must_use]
    pub fn update_layer(layer: LayerId, props: LayerPatch) -> Self {
        Self::new(SceneOp::UpdateLayer { layer, props })
    }

    #[must_use]
    pub fn add_layer_by_data_url(data_url: impl Into<ImageRef>, width: f64, height: f64) -> Self {
        Self::new(SceneOp::AddLayerByDataUrl { data_url: data_url.into(), thumbnail_image: None, width, height })
    }

    /// An `addLayerByDataURL` with a separate thumbnail image.
    #[must_use]
    pub fn add_layer_with_thumbnail(
        data_url: impl Into<ImageRef>,
        thumbnail: impl Into<ImageRef>,
        width: f64,
        height: f64,
    ) -> Self {
        Self::new(SceneOp::AddLayerByDataUrl {
            data_url: data_url.into(),
            thumbnail_image: Some(thumbnail.into()),
            width,
            height,
        })
    }

    #[must_use]
    pub fn reorder_layers(layers: Vec<LayerId>) -> Self {
        Self::new(SceneOp::ReorderLayers { layers })
    }

    /// Parse an action object from the UI collaborator.
    ///
    /// # Errors
    ///
    /// `UnknownAction` when `"type"` names no known operation (logged);
    /// `MalformedAction` when the tag is missing or the fields do not fit.
    pub fn from_json(value: &Value) -> Result<Self, SceneError> {
        let Some(tag) = value.get("type").and_then(Value::as_str) else {
            return Err(SceneError::MalformedAction(<serde_json::Error as serde::de::Error>::missing_field("type")));
        };
        if ActionKind::parse(tag).is_none() {
            error!(kind = %tag, "unknown scene action");
            return Err(SceneError::UnknownAction { kind: tag.to_owned() });
        }
        let op = SceneOp::deserialize(value)?;
        let batch_token = match value.get("historyBatchToken") {
            Some(token) => Option::<BatchToken>::deserialize(token)?,
            None => None,
        };
        Ok(Self { op, batch_token })
    }

    /// Wire form of this action.
    ///
    /// # Errors
    ///
    /// Propagates serialization failure.
    pub fn to_json(&self) -> Result<Value, SceneError> {
        let mut value = serde_json::to_value(&self.op)?;
        if let (Some(token), Value::Object(map)) = (&self.batch_token, &mut value) {
            map.insert("historyBatchToken".into(), Value::String(token.as_str().to_owned()));
        }
        Ok(value)
    }
}

// =============================================================================
// REDUCER
// =============================================================================

/// The pure scene reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneReducer;

impl Reducer for SceneReducer {
    type State = Scene;
    type Action = Action;
    type Error = SceneError;

    fn reduce(&self, scene: &Scene, action: &Action) -> Result<Scene, SceneError> {
        match &action.op {
            SceneOp::Set { state } => {
                validate_scene(state)?;
                Ok(state.as_ref().clone())
            }
            SceneOp::SetEditMode { edit_mode } => Ok(Scene { edit_mode: *edit_mode, ..scene.clone() }),
            SceneOp::UpdateCanvas { props } => update_canvas(scene, props),
            SceneOp::AddLayer { layer } => add_layer(scene, layer.clone()),
            SceneOp::AddLayerByDataUrl { data_url, thumbnail_image, width, height } => {
                add_layer_by_data_url(scene, data_url, thumbnail_image.as_deref(), *width, *height)
            }
            SceneOp::SelectLayer { layer } => select(scene, *layer),
            SceneOp::UpdateLayer { layer, props } => update_layer(scene, *layer, props),
            SceneOp::ReorderLayers { layers } => reorder_layers(scene, layers),
        }
    }
}

fn valid_size(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

/// Check a whole incoming scene: one selection at most, unique ids, and a
/// next id above all of them.
fn validate_scene(scene: &Scene) -> Result<(), SceneError> {
    let selected = usize::from(scene.canvas.selected) + scene.layers.iter().filter(|l| l.selected).count();
    if selected > 1 {
        return Err(SceneError::InvalidScene("more than one item selected"));
    }
    let mut ids = HashSet::with_capacity(scene.layers.len());
    if !scene.layers.iter().all(|l| ids.insert(l.id)) {
        return Err(SceneError::InvalidScene("duplicate layer id"));
    }
    if scene.layers.iter().any(|l| l.id >= scene.next_layer_id) {
        return Err(SceneError::InvalidScene("next layer id not above every layer id"));
    }
    Ok(())
}

fn update_canvas(scene: &Scene, props: &CanvasPatch) -> Result<Scene, SceneError> {
    if let Some(size) = props.size {
        if !valid_size(size.x, size.y) {
            return Err(SceneError::InvalidCanvasSize { width: size.x, height: size.y });
        }
    }
    Ok(Scene { canvas: props.apply(&scene.canvas), ..scene.clone() })
}

/// Copy of `scene` with exactly `item` selected (or nothing, for `None`).
fn with_selection(scene: &Scene, item: Option<Selection>) -> Scene {
    let mut out = scene.clone();
    out.canvas.selected = item == Some(Selection::Canvas);
    for layer in &mut out.layers {
        layer.selected = item == Some(Selection::Layer(layer.id));
    }
    out
}

fn select(scene: &Scene, item: Option<Selection>) -> Result<Scene, SceneError> {
    if let Some(Selection::Layer(id)) = item {
        if scene.layer(id).is_none() {
            return Err(SceneError::LayerNotFound(id));
        }
    }
    Ok(with_selection(scene, item))
}

fn add_layer(scene: &Scene, layer: Layer) -> Result<Scene, SceneError> {
    if scene.layer(layer.id).is_some() {
        return Err(SceneError::DuplicateLayerId(layer.id));
    }
    let after = layer.id.checked_add(1).ok_or(SceneError::LayerIdExhausted(layer.id))?;
    let mut out = if layer.selected { with_selection(scene, None) } else { scene.clone() };
    out.next_layer_id = out.next_layer_id.max(after);
    out.layers.push(layer);
    Ok(out)
}

fn add_layer_by_data_url(
    scene: &Scene,
    data_url: &str,
    thumbnail: Option<&str>,
    width: f64,
    height: f64,
) -> Result<Scene, SceneError> {
    if !valid_size(width, height) {
        return Err(SceneError::InvalidImageSize { width, height });
    }
    let mut layer = Layer::fitted(scene.next_layer_id, data_url.to_owned(), Vec2::new(width, height), scene.canvas.size);
    layer.thumbnail = Some(thumbnail.unwrap_or(data_url).to_owned());
    layer.selected = true;
    add_layer(scene, layer)
}

fn update_layer(scene: &Scene, id: LayerId, props: &LayerPatch) -> Result<Scene, SceneError> {
    let idx = scene.layer_index(id).ok_or(SceneError::LayerNotFound(id))?;
    if !props.is_finite() {
        return Err(SceneError::InvalidLayerPatch(id));
    }
    let mut out = scene.clone();
    out.layers[idx] = props.apply(&scene.layers[idx]);
    Ok(out)
}

fn reorder_layers(scene: &Scene, ids: &[LayerId]) -> Result<Scene, SceneError> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut layers = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(SceneError::InvalidLayerOrder);
        }
        let layer = scene.layer(id).ok_or(SceneError::InvalidLayerOrder)?;
        layers.push(layer.clone());
    }
    Ok(Scene { layers, ..scene.clone() })
}
