#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::error::ErrorCode;

fn reduce(scene: &Scene, action: Action) -> Result<Scene, SceneError> {
    SceneReducer.reduce(scene, &action)
}

fn import(scene: &Scene, w: f64, h: f64) -> Scene {
    reduce(scene, Action::add_layer_by_data_url("data:image/png;base64,AAAA", w, h)).unwrap()
}

fn scene_with_three() -> Scene {
    let scene = Scene::default();
    let scene = import(&scene, 100.0, 100.0);
    let scene = import(&scene, 200.0, 100.0);
    import(&scene, 100.0, 200.0)
}

// =============================================================================
// addLayerByDataURL
// =============================================================================

#[test]
fn add_by_data_url_fits_limiting_dimension() {
    let scene = import(&Scene::default(), 1024.0, 512.0);
    let layer = &scene.layers[0];
    let expected = (60.0_f64 / 1024.0).min(40.0 / 512.0);
    assert!((expected - 0.0586).abs() < 1e-4);
    assert_eq!(layer.scale.x, expected);
    assert_eq!(layer.scale.y, expected);
    assert_eq!(layer.translation, Vec2::ZERO);
    assert_eq!(layer.opacity, 1.0);
}

#[test]
fn add_by_data_url_selects_new_layer_only() {
    let mut scene = scene_with_three();
    scene.canvas.selected = true;
    for layer in &mut scene.layers {
        layer.selected = false;
    }
    let out = import(&scene, 10.0, 10.0);
    assert!(!out.canvas.selected);
    assert_eq!(out.selected(), Some(Selection::Layer(4)));
    assert_eq!(out.layers.iter().filter(|l| l.selected).count(), 1);
}

#[test]
fn add_by_data_url_uses_next_id_and_advances_it() {
    let scene = scene_with_three();
    assert_eq!(scene.layer_ids(), vec![1, 2, 3]);
    assert_eq!(scene.next_layer_id, 4);
    let out = import(&scene, 10.0, 10.0);
    assert_eq!(out.layers[3].id, 4);
    assert_eq!(out.next_layer_id, 5);
}

#[test]
fn add_by_data_url_sets_thumbnail() {
    let scene = import(&Scene::default(), 10.0, 10.0);
    assert_eq!(scene.layers[0].thumbnail.as_deref(), Some("data:image/png;base64,AAAA"));
}

#[test]
fn add_by_data_url_prefers_explicit_thumbnail() {
    let scene = reduce(&Scene::default(), Action::add_layer_with_thumbnail("data:full", "data:thumb", 10.0, 10.0)).unwrap();
    assert_eq!(scene.layers[0].image, "data:full");
    assert_eq!(scene.layers[0].thumbnail.as_deref(), Some("data:thumb"));
}

#[test]
fn add_by_data_url_rejects_zero_size() {
    let err = reduce(&Scene::default(), Action::add_layer_by_data_url("x", 0.0, 10.0)).unwrap_err();
    assert!(matches!(err, SceneError::InvalidImageSize { .. }));
}

#[test]
fn add_by_data_url_rejects_nan_size() {
    let err = reduce(&Scene::default(), Action::add_layer_by_data_url("x", 10.0, f64::NAN)).unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_IMAGE_SIZE");
}

// =============================================================================
// addLayer
// =============================================================================

#[test]
fn add_layer_bumps_next_id_past_explicit_id() {
    let layer = Layer::fitted(9, "img".into(), Vec2::new(10.0, 10.0), Vec2::new(60.0, 40.0));
    let out = reduce(&Scene::default(), SceneOp::AddLayer { layer }.into()).unwrap();
    assert_eq!(out.next_layer_id, 10);
}

#[test]
fn add_layer_never_lowers_next_id() {
    let scene = scene_with_three();
    let mut removed = reduce(&scene, Action::reorder_layers(vec![2, 3])).unwrap();
    removed.next_layer_id = 4;
    let layer = Layer::fitted(1, "img".into(), Vec2::new(10.0, 10.0), Vec2::new(60.0, 40.0));
    let out = reduce(&removed, SceneOp::AddLayer { layer }.into()).unwrap();
    assert_eq!(out.next_layer_id, 4);
}

#[test]
fn add_layer_rejects_duplicate_id() {
    let scene = scene_with_three();
    let layer = Layer::fitted(2, "img".into(), Vec2::new(10.0, 10.0), Vec2::new(60.0, 40.0));
    let err = reduce(&scene, SceneOp::AddLayer { layer }.into()).unwrap_err();
    assert!(matches!(err, SceneError::DuplicateLayerId(2)));
}

#[test]
fn add_layer_rejects_max_id() {
    let layer = Layer::fitted(LayerId::MAX, "img".into(), Vec2::new(10.0, 10.0), Vec2::new(60.0, 40.0));
    let err = reduce(&Scene::default(), SceneOp::AddLayer { layer }.into()).unwrap_err();
    assert!(matches!(err, SceneError::LayerIdExhausted(id) if id == LayerId::MAX));
    assert_eq!(err.error_code(), "E_LAYER_ID_EXHAUSTED");
}

#[test]
fn add_selected_layer_deselects_others() {
    let scene = scene_with_three();
    let mut layer = Layer::fitted(7, "img".into(), Vec2::new(10.0, 10.0), Vec2::new(60.0, 40.0));
    layer.selected = true;
    let out = reduce(&scene, SceneOp::AddLayer { layer }.into()).unwrap();
    assert_eq!(out.selected(), Some(Selection::Layer(7)));
    assert_eq!(out.layers.iter().filter(|l| l.selected).count(), 1);
}

// =============================================================================
// selectLayer
// =============================================================================

#[test]
fn select_canvas_deselects_layers() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::select(Some(Selection::Canvas))).unwrap();
    assert!(out.canvas.selected);
    assert!(out.layers.iter().all(|l| !l.selected));
}

#[test]
fn select_layer_marks_exactly_one() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::select(Some(Selection::Layer(2)))).unwrap();
    assert_eq!(out.selected(), Some(Selection::Layer(2)));
    assert!(!out.canvas.selected);
    assert_eq!(out.layers.iter().filter(|l| l.selected).count(), 1);
}

#[test]
fn select_none_clears_everything() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::select(None)).unwrap();
    assert_eq!(out.selected(), None);
}

#[test]
fn select_unknown_layer_is_error() {
    let scene = scene_with_three();
    let err = reduce(&scene, Action::select(Some(Selection::Layer(42)))).unwrap_err();
    assert!(matches!(err, SceneError::LayerNotFound(42)));
}

// =============================================================================
// updateLayer / updateCanvas / setEditMode
// =============================================================================

#[test]
fn update_layer_touches_only_target() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::update_layer(2, LayerPatch::translation(Vec2::new(5.0, 6.0)))).unwrap();
    assert_eq!(out.layer(2).unwrap().translation, Vec2::new(5.0, 6.0));
    assert_eq!(out.layer(1), scene.layer(1));
    assert_eq!(out.layer(3), scene.layer(3));
}

#[test]
fn update_layer_rejects_non_finite_values() {
    let scene = scene_with_three();
    for props in [
        LayerPatch::opacity(f64::NAN),
        LayerPatch::rotation(f64::INFINITY),
        LayerPatch::translation(Vec2::new(f64::NAN, 0.0)),
        LayerPatch::scale(Vec2::new(1.0, f64::NEG_INFINITY)),
    ] {
        let err = reduce(&scene, Action::update_layer(2, props)).unwrap_err();
        assert!(matches!(err, SceneError::InvalidLayerPatch(2)));
    }
}

#[test]
fn update_layer_unknown_id_is_error() {
    let err = reduce(&scene_with_three(), Action::update_layer(9, LayerPatch::rotation(1.0))).unwrap_err();
    assert_eq!(err.error_code(), "E_LAYER_NOT_FOUND");
}

#[test]
fn update_canvas_merges_props() {
    let patch = CanvasPatch { image: Some("bg".into()), ..Default::default() };
    let out = reduce(&Scene::default(), SceneOp::UpdateCanvas { props: patch }.into()).unwrap();
    assert_eq!(out.canvas.image.as_deref(), Some("bg"));
    assert_eq!(out.canvas.size, Vec2::new(60.0, 40.0));
}

#[test]
fn update_canvas_rejects_bad_size() {
    let patch = CanvasPatch { size: Some(Vec2::new(-1.0, 40.0)), ..Default::default() };
    let err = reduce(&Scene::default(), SceneOp::UpdateCanvas { props: patch }.into()).unwrap_err();
    assert!(matches!(err, SceneError::InvalidCanvasSize { .. }));
}

#[test]
fn set_edit_mode_changes_only_mode() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::set_edit_mode(EditMode::Rotate)).unwrap();
    assert_eq!(out.edit_mode, EditMode::Rotate);
    assert_eq!(out.layers, scene.layers);
}

#[test]
fn set_replaces_whole_scene() {
    let other = scene_with_three();
    let out = reduce(&Scene::default(), SceneOp::Set { state: Box::new(other.clone()) }.into()).unwrap();
    assert_eq!(out, other);
}

#[test]
fn set_rejects_two_selected_items() {
    let mut other = scene_with_three();
    other.canvas.selected = true;
    let err = reduce(&Scene::default(), SceneOp::Set { state: Box::new(other) }.into()).unwrap_err();
    assert!(matches!(err, SceneError::InvalidScene(_)));
    assert_eq!(err.error_code(), "E_INVALID_SCENE");
}

#[test]
fn set_rejects_duplicate_layer_ids() {
    let mut other = scene_with_three();
    other.layers[1].id = 1;
    let err = reduce(&Scene::default(), SceneOp::Set { state: Box::new(other) }.into()).unwrap_err();
    assert!(matches!(err, SceneError::InvalidScene(_)));
}

#[test]
fn set_rejects_stale_next_layer_id() {
    let mut other = scene_with_three();
    other.next_layer_id = 3;
    let err = reduce(&Scene::default(), SceneOp::Set { state: Box::new(other) }.into()).unwrap_err();
    assert!(matches!(err, SceneError::InvalidScene(_)));
}

#[test]
fn set_from_json_with_bad_scene_is_rejected() {
    let mut other = Scene::default();
    other.canvas.selected = true;
    let mut layer = Layer::fitted(5, "img".into(), Vec2::new(10.0, 10.0), other.canvas.size);
    layer.selected = true;
    other.layers.push(layer);
    other.next_layer_id = 1;
    let action = Action::from_json(&json!({ "type": "set", "state": other })).unwrap();
    assert!(reduce(&Scene::default(), action).is_err());
}

// =============================================================================
// reorderLayers
// =============================================================================

#[test]
fn reorder_applies_permutation() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::reorder_layers(vec![3, 1, 2])).unwrap();
    assert_eq!(out.layer_ids(), vec![3, 1, 2]);
}

#[test]
fn delete_non_selected_layer_preserves_selection() {
    let scene = scene_with_three();
    assert_eq!(scene.selected(), Some(Selection::Layer(3)));
    let order = scene.order_without(1).unwrap();
    let out = reduce(&scene, Action::reorder_layers(order)).unwrap();
    assert_eq!(out.selected(), Some(Selection::Layer(3)));
    assert_eq!(out.layer_ids(), vec![2, 3]);
}

#[test]
fn raise_preserves_selection() {
    let scene = scene_with_three();
    let order = scene.lowered_order(3).unwrap();
    let out = reduce(&scene, Action::reorder_layers(order)).unwrap();
    assert_eq!(out.layer_ids(), vec![1, 3, 2]);
    assert_eq!(out.selected(), Some(Selection::Layer(3)));
}

#[test]
fn deleting_keeps_next_id() {
    let scene = scene_with_three();
    let out = reduce(&scene, Action::reorder_layers(vec![1])).unwrap();
    assert_eq!(out.next_layer_id, 4);
}

#[test]
fn reorder_rejects_unknown_id() {
    let err = reduce(&scene_with_three(), Action::reorder_layers(vec![1, 2, 8])).unwrap_err();
    assert!(matches!(err, SceneError::InvalidLayerOrder));
}

#[test]
fn reorder_rejects_duplicates() {
    let err = reduce(&scene_with_three(), Action::reorder_layers(vec![1, 1, 2])).unwrap_err();
    assert!(matches!(err, SceneError::InvalidLayerOrder));
}

// =============================================================================
// Purity
// =============================================================================

#[test]
fn reducer_never_mutates_input() {
    let scene = scene_with_three();
    let before = scene.clone();
    let actions = vec![
        Action::select(Some(Selection::Canvas)),
        Action::set_edit_mode(EditMode::Scale),
        Action::update_layer(1, LayerPatch::opacity(0.2)),
        Action::reorder_layers(vec![2]),
        Action::add_layer_by_data_url("x", 5.0, 5.0),
    ];
    for action in actions {
        let _next = reduce(&scene, action).unwrap();
        assert_eq!(scene, before);
    }
}

#[test]
fn reducer_is_deterministic() {
    let scene = scene_with_three();
    let action = Action::update_layer(2, LayerPatch::scale(Vec2::new(2.0, 3.0)));
    assert_eq!(reduce(&scene, action.clone()).unwrap(), reduce(&scene, action).unwrap());
}

// =============================================================================
// JSON actions
// =============================================================================

#[test]
fn from_json_parses_add_by_data_url() {
    let action = Action::from_json(&json!({
        "type": "addLayerByDataURL",
        "dataUrl": "data:x",
        "width": 1024,
        "height": 512,
    }))
    .unwrap();
    assert_eq!(action, Action::add_layer_by_data_url("data:x", 1024.0, 512.0));
}

#[test]
fn from_json_reads_thumbnail_image() {
    let action = Action::from_json(&json!({
        "type": "addLayerByDataURL",
        "dataUrl": "data:x",
        "thumbnailImage": "data:t",
        "width": 4,
        "height": 2,
    }))
    .unwrap();
    assert_eq!(action, Action::add_layer_with_thumbnail("data:x", "data:t", 4.0, 2.0));
}

#[test]
fn from_json_reads_batch_token() {
    let action = Action::from_json(&json!({
        "type": "updateLayer",
        "layer": 3,
        "props": { "translation": [1.0, 2.0] },
        "historyBatchToken": "drag:position",
    }))
    .unwrap();
    assert_eq!(action.batch_token.as_ref().map(BatchToken::as_str), Some("drag:position"));
    assert_eq!(action.op, SceneOp::UpdateLayer { layer: 3, props: LayerPatch::translation(Vec2::new(1.0, 2.0)) });
}

#[test]
fn from_json_select_null_deselects() {
    let action = Action::from_json(&json!({ "type": "selectLayer", "layer": null })).unwrap();
    assert_eq!(action, Action::select(None));
}

#[test]
fn from_json_select_canvas() {
    let action = Action::from_json(&json!({ "type": "selectLayer", "layer": "canvas" })).unwrap();
    assert_eq!(action, Action::select(Some(Selection::Canvas)));
}

#[test]
fn from_json_unknown_type_is_loud() {
    let err = Action::from_json(&json!({ "type": "explode" })).unwrap_err();
    assert!(matches!(err, SceneError::UnknownAction { ref kind } if kind == "explode"));
    assert_eq!(err.error_code(), "E_UNKNOWN_ACTION");
}

#[test]
fn from_json_missing_type_is_malformed() {
    let err = Action::from_json(&json!({ "layer": 1 })).unwrap_err();
    assert!(matches!(err, SceneError::MalformedAction(_)));
}

#[test]
fn from_json_bad_fields_are_malformed() {
    let err = Action::from_json(&json!({ "type": "updateLayer", "layer": "three" })).unwrap_err();
    assert!(matches!(err, SceneError::MalformedAction(_)));
}

#[test]
fn to_json_round_trips_through_from_json() {
    let action = Action::update_layer(1, LayerPatch::rotation(0.5)).batched("drag:rotate");
    let value = action.to_json().unwrap();
    assert_eq!(value["type"], json!("updateLayer"));
    assert_eq!(value["historyBatchToken"], json!("drag:rotate"));
    assert_eq!(Action::from_json(&value).unwrap(), action);
}

#[test]
fn action_kinds_parse_their_own_tags() {
    for kind in ActionKind::ALL {
        assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(ActionKind::parse("history:undo"), None);
}

#[test]
fn transient_kinds_are_selection_and_mode() {
    let kinds = ActionKind::transient();
    assert!(kinds.contains(&ActionKind::SelectLayer));
    assert!(kinds.contains(&ActionKind::SetEditMode));
    assert!(!kinds.contains(&ActionKind::UpdateLayer));
}
