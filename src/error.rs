//! Error codes and the editor-level error.
//!
//! Every module boundary has its own `thiserror` enum. Each implements
//! [`ErrorCode`] so a host can report a stable `E_*` string to its UI layer
//! without matching on the Rust type. [`EditorError`] composes the module
//! errors for the editor and actor entry points.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::coords::CoordsError;
use crate::projection::ProjectionError;
use crate::reducer::SceneError;

/// Stable machine-readable code for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Coords(#[from] CoordsError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("editor task is no longer running")]
    ActorClosed,
}

impl ErrorCode for EditorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Scene(e) => e.error_code(),
            Self::Coords(e) => e.error_code(),
            Self::Projection(e) => e.error_code(),
            Self::ActorClosed => "E_ACTOR_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ActorClosed)
    }
}
