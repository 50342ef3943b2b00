use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::geometry::Rect;

/// One grayscale video frame, as delivered by the camera feed.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major luma8 pixels, `width * height` bytes.
    pub luma: Vec<u8>,
    pub at: DateTime<Utc>,
}

/// Dominant facial expression, when the backing engine classifies one.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub label: String,
    pub score: f32,
}

/// Output of a single detector call, in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bounds: Rect,
    pub score: f32,
    pub expression: Option<Expression>,
}

/// Tuning shared by detector implementations.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Frames are downscaled so their longer side is at most this before
    /// inference; boxes are scaled back to frame coordinates afterwards.
    pub input_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { input_size: 256 }
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("model failure: {0}")]
    Model(String),
    #[error("inference failure: {0}")]
    Inference(String),
}

/// A face detection engine. The actual network is an external collaborator;
/// this trait is the seam the tracker talks through.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect the most prominent face in `frame`, or `None` when no face is
    /// visible.
    async fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError>;

    /// Names of the model bundles this engine needs loaded before it can run.
    fn bundles(&self) -> &[&str];
}

/// Supplies the most recent webcam frame. The tracker always wants the
/// newest frame, never a backlog.
pub trait FrameSource: Send + Sync {
    fn latest(&self) -> Option<Frame>;
}
