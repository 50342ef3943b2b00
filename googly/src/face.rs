use std::io::Cursor;

use async_trait::async_trait;
use image::GrayImage;
use image::imageops::FilterType;
use ogle::{DetectError, Detection, Detector, DetectorConfig, Frame, Rect};
use rustface::{Detector as _, ImageData, Model, create_detector_with_model, read_model};

use crate::models::{ModelError, ModelStore};

/// Frontal face detection bundle consumed by the Seeta engine.
pub const FRONTAL_MODEL: &str = "seeta_fd_frontal_v1.0.bin";

/// Face detector backed by the SeetaFace engine.
///
/// The model is parsed once at construction, so a corrupt bundle fails the
/// bootstrap instead of the first detection. Inference is CPU-bound and runs
/// on the blocking pool. Frames larger than the configured input size are
/// shrunk first and the winning box scaled back into frame coordinates.
/// Seeta does not classify expressions, so detections carry
/// `expression: None`.
pub struct SeetaDetector {
    model: Model,
    config: DetectorConfig,
}

impl SeetaDetector {
    pub const BUNDLES: &'static [&'static str] = &[FRONTAL_MODEL];

    pub fn from_store(store: &ModelStore, config: DetectorConfig) -> Result<Self, ModelError> {
        let bytes = store
            .bytes(FRONTAL_MODEL)
            .ok_or_else(|| ModelError::Missing {
                name: FRONTAL_MODEL.to_string(),
                dir: store.dir().to_path_buf(),
            })?;
        let model =
            read_model(Cursor::new(bytes.as_slice())).map_err(|err| ModelError::Invalid {
                name: FRONTAL_MODEL.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self { model, config })
    }
}

#[async_trait]
impl Detector for SeetaDetector {
    async fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError> {
        let (gray, scale) = downscale(frame, self.config.input_size).ok_or_else(|| {
            DetectError::Inference("frame buffer does not match its dimensions".into())
        })?;
        let model = self.model.clone();
        let found = tokio::task::spawn_blocking(move || run_engine(model, &gray))
            .await
            .map_err(|err| DetectError::Inference(err.to_string()))?;
        Ok(found.map(|(bounds, score)| Detection {
            bounds: bounds.scaled(1.0 / scale, 1.0 / scale),
            score,
            expression: None,
        }))
    }

    fn bundles(&self) -> &[&str] {
        Self::BUNDLES
    }
}

/// Shrink the frame so its longer side is at most `input_size`. Returns the
/// luma image plus the scale that was applied.
fn downscale(frame: &Frame, input_size: u32) -> Option<(GrayImage, f64)> {
    let gray = GrayImage::from_raw(frame.width, frame.height, frame.luma.clone())?;
    let longer = frame.width.max(frame.height);
    if longer <= input_size {
        return Some((gray, 1.0));
    }
    let scale = input_size as f64 / longer as f64;
    let width = (frame.width as f64 * scale).round().max(1.0) as u32;
    let height = (frame.height as f64 * scale).round().max(1.0) as u32;
    Some((
        image::imageops::resize(&gray, width, height, FilterType::Triangle),
        scale,
    ))
}

fn run_engine(model: Model, gray: &GrayImage) -> Option<(Rect, f32)> {
    let mut engine = create_detector_with_model(model);
    engine.set_min_face_size(40);
    engine.set_score_thresh(2.0);
    engine.set_pyramid_scale_factor(0.8);
    engine.set_slide_window_step(4, 4);

    let (width, height) = gray.dimensions();
    let faces = engine.detect(&ImageData::new(gray, width, height));
    faces
        .into_iter()
        .max_by(|a, b| a.score().total_cmp(&b.score()))
        .map(|face| {
            let bbox = face.bbox();
            (
                Rect {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                },
                face.score() as f32,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn frame(width: u32, height: u32) -> Frame {
        Frame {
            width,
            height,
            luma: vec![0; (width * height) as usize],
            at: Utc::now(),
        }
    }

    #[test]
    fn small_frames_are_not_resized() {
        let (gray, scale) = downscale(&frame(200, 150), 256).unwrap();
        assert_eq!(gray.dimensions(), (200, 150));
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn large_frames_shrink_to_the_input_size() {
        let (gray, scale) = downscale(&frame(512, 256), 256).unwrap();
        assert_eq!(gray.dimensions(), (256, 128));
        assert_eq!(scale, 0.5);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let mut bad = frame(100, 100);
        bad.luma.truncate(10);
        assert!(downscale(&bad, 256).is_none());
    }
}
