//! Domain logic for the googly eye widget.
//!
//! `ogle` turns face detections into pupil movement. The [`tracker`] loop
//! polls a [`Detector`] until a face first appears and then follows it
//! frame by frame, feeding the [`gaze`] mapping and the widget state.
//! Everything IO-shaped (webcam frames, model files, the WebSocket surface)
//! lives in the `googly` crate.

pub mod boot;
pub mod detector;
pub mod event;
pub mod gaze;
pub mod geometry;
pub mod tracker;
pub mod widget;

pub use boot::{Boot, BootPhase};
pub use detector::{DetectError, Detection, Detector, DetectorConfig, Expression, Frame, FrameSource};
pub use event::{Event, EventBus};
pub use gaze::{GazeMapper, PupilOffset, MAX_PUPIL_OFFSET_X, MAX_PUPIL_OFFSET_Y};
pub use geometry::{DisplaySize, Point, Rect};
pub use tracker::{Tracker, TrackerConfig, TrackerHandle};
pub use widget::{Eyelids, WidgetState};
