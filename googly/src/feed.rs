use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use image::load_from_memory;
use ogle::{Frame, FrameSource};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("not an image data url")]
    DataUrl,
    #[error("frame is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("frame could not be decoded: {0}")]
    Image(#[from] image::ImageError),
}

/// Holds the most recent webcam frame for a session.
///
/// A watch cell rather than a queue: a slow detection cycle skips frames
/// instead of working through a backlog, so the widget always reacts to the
/// newest view of the room.
#[derive(Clone)]
pub struct FrameFeed {
    cell: watch::Sender<Option<Frame>>,
}

impl FrameFeed {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self { cell }
    }

    /// Decode a `data:image/...;base64,` URL into a frame and publish it.
    pub fn push_data_url(&self, url: &str) -> Result<(), FeedError> {
        let (mime, data) = parse_data_url(url).ok_or(FeedError::DataUrl)?;
        if !mime.starts_with("image/") {
            return Err(FeedError::DataUrl);
        }
        let bytes = BASE64.decode(data)?;
        let gray = load_from_memory(&bytes)?.to_luma8();
        let (width, height) = gray.dimensions();
        self.cell.send_replace(Some(Frame {
            width,
            height,
            luma: gray.into_raw(),
            at: Utc::now(),
        }));
        Ok(())
    }

    pub fn has_frame(&self) -> bool {
        self.cell.borrow().is_some()
    }
}

impl Default for FrameFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FrameFeed {
    fn latest(&self) -> Option<Frame> {
        self.cell.borrow().clone()
    }
}

fn parse_data_url(url: &str) -> Option<(String, String)> {
    let (prefix, data) = url.split_once(',')?;
    let mime = prefix
        .strip_prefix("data:")?
        .trim_end_matches(";base64");
    Some((mime.to_string(), data.to_string()))
}
