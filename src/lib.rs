//! Keystone-correction image editor core.
//!
//! A projector rarely hits a wall square-on. This crate holds the state and
//! math of an editor that arranges image layers on a fixed-size canvas and
//! pre-warps that canvas with a four-corner homography so the projected result
//! lands undistorted. Rendering and DOM wiring belong to the host; the crate
//! owns the scene, its undo history, the coordinate frames, and the pointer
//! gestures that edit them.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | Top-level [`editor::Editor`]: commands, pointer routing, render inputs |
//! | [`actor`] | Tokio task that serializes access to one editor |
//! | [`scene`] | Canvas, layers, selection, and edit mode |
//! | [`reducer`] | Scene actions, their JSON form, and the pure reducer |
//! | [`history`] | Generic undo/redo with batch coalescing |
//! | [`homography`] | Quad-to-quad projective maps |
//! | [`projection`] | Projector corner handles and the derived 4x4 matrix |
//! | [`coords`] | Viewport, GL, and canvas frames and the matrices between them |
//! | [`drag`] | Pointer capture state machine and handle hit-testing |
//! | [`handles`] | Layer and projector handles and the gestures they drive |
//! | [`redraw`] | Coalesced redraw requests |
//! | [`config`] | Environment-driven editor settings |
//! | [`error`] | Crate error type and stable error codes |
//! | [`math`] | Vector and matrix helpers on top of `glam` |
//! | [`consts`] | Shared numeric constants |

pub mod actor;
pub mod config;
pub mod consts;
pub mod coords;
pub mod drag;
pub mod editor;
pub mod error;
pub mod handles;
pub mod history;
pub mod homography;
pub mod math;
pub mod projection;
pub mod redraw;
pub mod reducer;
pub mod scene;
