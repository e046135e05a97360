//! Editor configuration from environment variables.
//!
//! Every key is optional. A missing, unparsable or out-of-range value falls
//! back to its default and is logged at `warn` (missing keys are silent).
//!
//! | env                          | default |
//! |------------------------------|---------|
//! | `KEYSTONE_CANVAS_WIDTH`      | 60      |
//! | `KEYSTONE_CANVAS_HEIGHT`     | 40      |
//! | `KEYSTONE_PROJECTOR_INSET`   | 0.95    |
//! | `KEYSTONE_HISTORY_LIMIT`     | 0 (unbounded) |
//! | `KEYSTONE_HANDLE_RADIUS_PX`  | 8       |
//! | `KEYSTONE_ACTOR_QUEUE`       | 64      |

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use tracing::warn;

use crate::consts::{
    DEFAULT_ACTOR_QUEUE, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_HANDLE_RADIUS_PX,
    DEFAULT_PROJECTOR_INSET,
};
use crate::math::Vec2;

pub const ENV_CANVAS_WIDTH: &str = "KEYSTONE_CANVAS_WIDTH";
pub const ENV_CANVAS_HEIGHT: &str = "KEYSTONE_CANVAS_HEIGHT";
pub const ENV_PROJECTOR_INSET: &str = "KEYSTONE_PROJECTOR_INSET";
pub const ENV_HISTORY_LIMIT: &str = "KEYSTONE_HISTORY_LIMIT";
pub const ENV_HANDLE_RADIUS_PX: &str = "KEYSTONE_HANDLE_RADIUS_PX";
pub const ENV_ACTOR_QUEUE: &str = "KEYSTONE_ACTOR_QUEUE";

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Size of the canvas in a fresh scene.
    pub canvas_size: Vec2,
    /// Projector handles start at `(±inset, ±inset)`.
    pub projector_inset: f64,
    /// Cap on undo entries; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Pointer hit radius for handles, in pixels.
    pub handle_radius_px: f64,
    /// Capacity of the editor task's command queue.
    pub actor_queue: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_size: Vec2::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
            projector_inset: DEFAULT_PROJECTOR_INSET,
            history_limit: None,
            handle_radius_px: DEFAULT_HANDLE_RADIUS_PX,
            actor_queue: DEFAULT_ACTOR_QUEUE,
        }
    }
}

impl EditorConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build from an arbitrary key lookup, e.g. a map in tests.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        let width = setting(&lookup, ENV_CANVAS_WIDTH, DEFAULT_CANVAS_WIDTH, positive);
        let height = setting(&lookup, ENV_CANVAS_HEIGHT, DEFAULT_CANVAS_HEIGHT, positive);
        let projector_inset =
            setting(&lookup, ENV_PROJECTOR_INSET, DEFAULT_PROJECTOR_INSET, |v: &f64| *v > 0.0 && *v <= 1.0);
        let history_limit: usize = setting(&lookup, ENV_HISTORY_LIMIT, 0, |_| true);
        let handle_radius_px = setting(&lookup, ENV_HANDLE_RADIUS_PX, DEFAULT_HANDLE_RADIUS_PX, positive);
        let actor_queue = setting(&lookup, ENV_ACTOR_QUEUE, DEFAULT_ACTOR_QUEUE, |v: &usize| *v > 0);

        Self {
            canvas_size: Vec2::new(width, height),
            projector_inset,
            history_limit: (history_limit > 0).then_some(history_limit),
            handle_radius_px,
            actor_queue,
        }
    }
}

/// Read `key`, falling back to `default` when it is absent, unparsable or
/// rejected by `valid`.
fn setting<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            warn!(key, raw = %raw, ?default, "ignoring invalid config value");
            default
        }
    }
}
