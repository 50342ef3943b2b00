use serde::{Deserialize, Serialize};

use crate::geometry::{DisplaySize, Point, Rect};

/// Maximum horizontal pupil travel in device-independent pixels.
pub const MAX_PUPIL_OFFSET_X: f64 = 20.0;
/// Maximum vertical pupil travel in device-independent pixels.
pub const MAX_PUPIL_OFFSET_Y: f64 = 15.0;

/// Translation applied to both pupils. Recomputed every detection cycle,
/// never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PupilOffset {
    pub x: f64,
    pub y: f64,
}

/// Maps a face detection box onto a pupil offset.
///
/// The mapping is a pure function of the box, the widget's center and the
/// display size: the face center's delta from the eye center is scaled by
/// viewport size into the pupil travel range. Both pupils receive the same
/// offset. Nothing clamps the result beyond that scaling, so a face at the
/// extreme edge of frame can push the pupil slightly past its intended
/// travel.
///
/// # Examples
/// ```
/// use ogle::{DisplaySize, GazeMapper, Point, Rect};
///
/// let mapper = GazeMapper::new(
///     DisplaySize { width: 1000.0, height: 800.0 },
///     Point { x: 500.0, y: 400.0 },
/// );
/// let face = Rect { x: 550.0, y: 390.0, width: 100.0, height: 80.0 };
/// let offset = mapper.offset(&face);
/// assert_eq!(offset.x, 2.0);
/// assert_eq!(offset.y, 0.5625);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GazeMapper {
    display: DisplaySize,
    eyes_center: Point,
}

impl GazeMapper {
    pub fn new(display: DisplaySize, eyes_center: Point) -> Self {
        Self {
            display,
            eyes_center,
        }
    }

    /// Compute the offset for a face box in display-space pixels.
    pub fn offset(&self, face_box: &Rect) -> PupilOffset {
        let face_center = face_box.center();
        PupilOffset {
            x: (face_center.x - self.eyes_center.x) / self.display.width * MAX_PUPIL_OFFSET_X,
            y: (face_center.y - self.eyes_center.y) / self.display.height * MAX_PUPIL_OFFSET_Y,
        }
    }
}
