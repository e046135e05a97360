#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn from_pairs(pairs: &[(&str, &str)]) -> EditorConfig {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    EditorConfig::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn defaults_match_constants() {
    let c = EditorConfig::default();
    assert_eq!(c.canvas_size, Vec2::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT));
    assert_eq!(c.projector_inset, DEFAULT_PROJECTOR_INSET);
    assert_eq!(c.history_limit, None);
    assert_eq!(c.handle_radius_px, DEFAULT_HANDLE_RADIUS_PX);
    assert_eq!(c.actor_queue, DEFAULT_ACTOR_QUEUE);
}

#[test]
fn empty_lookup_gives_defaults() {
    assert_eq!(from_pairs(&[]), EditorConfig::default());
}

#[test]
fn reads_every_key() {
    let c = from_pairs(&[
        (ENV_CANVAS_WIDTH, "80"),
        (ENV_CANVAS_HEIGHT, " 45 "),
        (ENV_PROJECTOR_INSET, "0.9"),
        (ENV_HISTORY_LIMIT, "50"),
        (ENV_HANDLE_RADIUS_PX, "12"),
        (ENV_ACTOR_QUEUE, "8"),
    ]);
    assert_eq!(c.canvas_size, Vec2::new(80.0, 45.0));
    assert_eq!(c.projector_inset, 0.9);
    assert_eq!(c.history_limit, Some(50));
    assert_eq!(c.handle_radius_px, 12.0);
    assert_eq!(c.actor_queue, 8);
}

#[test]
fn zero_history_limit_is_unbounded() {
    assert_eq!(from_pairs(&[(ENV_HISTORY_LIMIT, "0")]).history_limit, None);
}

#[test]
fn unparsable_values_fall_back() {
    let c = from_pairs(&[(ENV_CANVAS_WIDTH, "wide"), (ENV_ACTOR_QUEUE, "-3")]);
    assert_eq!(c.canvas_size.x, DEFAULT_CANVAS_WIDTH);
    assert_eq!(c.actor_queue, DEFAULT_ACTOR_QUEUE);
}

#[test]
fn out_of_range_values_fall_back() {
    let c = from_pairs(&[
        (ENV_CANVAS_HEIGHT, "0"),
        (ENV_PROJECTOR_INSET, "1.5"),
        (ENV_HANDLE_RADIUS_PX, "NaN"),
        (ENV_ACTOR_QUEUE, "0"),
    ]);
    assert_eq!(c.canvas_size.y, DEFAULT_CANVAS_HEIGHT);
    assert_eq!(c.projector_inset, DEFAULT_PROJECTOR_INSET);
    assert_eq!(c.handle_radius_px, DEFAULT_HANDLE_RADIUS_PX);
    assert_eq!(c.actor_queue, DEFAULT_ACTOR_QUEUE);
}

#[test]
fn from_env_reads_process_environment() {
    unsafe { std::env::set_var(ENV_HANDLE_RADIUS_PX, "14") };
    let c = EditorConfig::from_env();
    unsafe { std::env::remove_var(ENV_HANDLE_RADIUS_PX) };
    assert_eq!(c.handle_radius_px, 14.0);
}
