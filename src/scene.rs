//! Scene model: the canvas, its layers, and sparse patches against them.
//!
//! A [`Scene`] is a plain value. Every edit produces a new `Scene` through
//! the reducer; nothing here mutates in place. Two invariants hold for every
//! scene the reducer produces:
//!
//! - at most one of {canvas, any layer} has `selected == true`;
//! - `next_layer_id` is strictly greater than every existing layer id.
//!
//! Layer order is paint order: index 0 is drawn first (bottom).

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::{Deserialize, Serialize};

use crate::consts::{CANVAS_EDIT_LAYER_OPACITY, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::coords::canvas_quad;
use crate::homography::Quad;
use crate::math::{Mat3, Vec2};

/// Identifier for a layer. Monotonic and never reused within a session.
pub type LayerId = u64;

/// Opaque reference to image data (typically a data URL).
pub type ImageRef = String;

/// Which transform handles are shown for the selected layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    None,
    Move,
    Scale,
    Rotate,
}

/// The virtual print/projection surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub id: u64,
    /// Extent in canvas units; the canvas is centered on the origin.
    pub size: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    #[serde(default)]
    pub selected: bool,
}

impl Canvas {
    #[must_use]
    pub fn new(size: Vec2) -> Self {
        Self { id: 0, size, image: None, thumbnail: None, selected: false }
    }

    /// Canvas corners in canvas space, in quad order (TL, TR, BR, BL).
    #[must_use]
    pub fn corners(&self) -> Quad {
        canvas_quad(self.size)
    }
}

/// A user-placed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub image: ImageRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    /// Intrinsic pixel size of the image.
    pub size: Vec2,
    pub scale: Vec2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f64,
    /// Center position in canvas space.
    pub translation: Vec2,
    /// In `[0, 1]`.
    pub opacity: f64,
    #[serde(default)]
    pub selected: bool,
}

impl Layer {
    /// A layer uniformly scaled so the image fits inside `canvas_size`,
    /// centered, fully opaque, not selected.
    #[must_use]
    pub fn fitted(id: LayerId, image: ImageRef, size: Vec2, canvas_size: Vec2) -> Self {
        let scale = (canvas_size.x / size.x).min(canvas_size.y / size.y);
        Self {
            id,
            image,
            thumbnail: None,
            size,
            scale: Vec2::splat(scale),
            rotation: 0.0,
            translation: Vec2::ZERO,
            opacity: 1.0,
            selected: false,
        }
    }

    /// Layer-local (pixels, centered) to canvas space: `T · R · S`.
    #[must_use]
    pub fn model_matrix(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(self.scale, self.rotation, self.translation)
    }

    /// The layer's image rectangle in canvas space, in quad order.
    #[must_use]
    pub fn corners(&self) -> Quad {
        let m = self.model_matrix();
        canvas_quad(self.size).map(|p| m.transform_point2(p))
    }

    /// Opacity to draw with. Layers are dimmed while the canvas is selected
    /// so the canvas background stays visible for projector alignment.
    #[must_use]
    pub fn display_opacity(&self, canvas_selected: bool) -> f64 {
        if canvas_selected { self.opacity.min(CANVAS_EDIT_LAYER_OPACITY) } else { self.opacity }
    }
}

/// The selectable items in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Canvas,
    Layer(LayerId),
}

/// Sparse update for the canvas. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
}

impl CanvasPatch {
    /// Shallow-merge onto `canvas`, returning the merged copy.
    #[must_use]
    pub fn apply(&self, canvas: &Canvas) -> Canvas {
        let mut out = canvas.clone();
        if let Some(size) = self.size {
            out.size = size;
        }
        if let Some(ref image) = self.image {
            out.image = Some(image.clone());
        }
        if let Some(ref thumbnail) = self.thumbnail {
            out.thumbnail = Some(thumbnail.clone());
        }
        out
    }
}

/// Sparse update for a layer. Only present fields are applied.
///
/// Selection is deliberately absent; it only changes through `selectLayer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl LayerPatch {
    #[must_use]
    pub fn translation(translation: Vec2) -> Self {
        Self { translation: Some(translation), ..Default::default() }
    }

    #[must_use]
    pub fn scale(scale: Vec2) -> Self {
        Self { scale: Some(scale), ..Default::default() }
    }

    #[must_use]
    pub fn rotation(rotation: f64) -> Self {
        Self { rotation: Some(rotation), ..Default::default() }
    }

    #[must_use]
    pub fn opacity(opacity: f64) -> Self {
        Self { opacity: Some(opacity), ..Default::default() }
    }

    /// Whether every numeric field present is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.size.is_none_or(Vec2::is_finite)
            && self.scale.is_none_or(Vec2::is_finite)
            && self.rotation.is_none_or(f64::is_finite)
            && self.translation.is_none_or(Vec2::is_finite)
            && self.opacity.is_none_or(f64::is_finite)
    }

    /// Shallow-merge onto `layer`, returning the merged copy. Opacity is
    /// clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(&self, layer: &Layer) -> Layer {
        let mut out = layer.clone();
        if let Some(ref image) = self.image {
            out.image = image.clone();
        }
        if let Some(ref thumbnail) = self.thumbnail {
            out.thumbnail = Some(thumbnail.clone());
        }
        if let Some(size) = self.size {
            out.size = size;
        }
        if let Some(scale) = self.scale {
            out.scale = scale;
        }
        if let Some(rotation) = self.rotation {
            out.rotation = rotation;
        }
        if let Some(translation) = self.translation {
            out.translation = translation;
        }
        if let Some(opacity) = self.opacity {
            out.opacity = opacity.clamp(0.0, 1.0);
        }
        out
    }
}

/// The complete editable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub edit_mode: EditMode,
    pub canvas: Canvas,
    pub layers: Vec<Layer>,
    pub next_layer_id: LayerId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Vec2::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT))
    }
}

impl Scene {
    /// Empty scene: canvas id 0, no layers, first layer id 1.
    #[must_use]
    pub fn new(canvas_size: Vec2) -> Self {
        Self { edit_mode: EditMode::None, canvas: Canvas::new(canvas_size), layers: Vec::new(), next_layer_id: 1 }
    }

    /// The selected item, if any.
    #[must_use]
    pub fn selected(&self) -> Option<Selection> {
        if self.canvas.selected {
            return Some(Selection::Canvas);
        }
        self.selected_layer().map(|l| Selection::Layer(l.id))
    }

    #[must_use]
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.selected)
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Layer ids in paint order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    /// Order with `id` moved one step toward the top, or `None` if it is
    /// already topmost or absent.
    #[must_use]
    pub fn raised_order(&self, id: LayerId) -> Option<Vec<LayerId>> {
        let idx = self.layer_index(id)?;
        if idx + 1 >= self.layers.len() {
            return None;
        }
        let mut ids = self.layer_ids();
        ids.swap(idx, idx + 1);
        Some(ids)
    }

    /// Order with `id` moved one step toward the bottom, or `None` if it is
    /// already bottommost or absent.
    #[must_use]
    pub fn lowered_order(&self, id: LayerId) -> Option<Vec<LayerId>> {
        let idx = self.layer_index(id)?;
        if idx == 0 {
            return None;
        }
        let mut ids = self.layer_ids();
        ids.swap(idx - 1, idx);
        Some(ids)
    }

    /// Order with `id` removed (deletion), or `None` if it is absent.
    #[must_use]
    pub fn order_without(&self, id: LayerId) -> Option<Vec<LayerId>> {
        self.layer_index(id)?;
        Some(self.layers.iter().map(|l| l.id).filter(|&other| other != id).collect())
    }
}
