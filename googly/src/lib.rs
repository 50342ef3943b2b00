//! Server side of the googly eye widget.
//!
//! Serves the widget page, accepts webcam frames over WebSocket, runs the
//! Seeta face detector on them and streams gaze updates back.

pub mod face;
pub mod feed;
pub mod logging;
pub mod models;
pub mod web;

pub use face::SeetaDetector;
pub use feed::FrameFeed;
pub use models::{ModelError, ModelStore};
pub use web::{AppState, SessionConfig, app, index};
