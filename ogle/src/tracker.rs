use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use crate::detector::{Detector, FrameSource};
use crate::event::{Event, EventBus};
use crate::gaze::GazeMapper;
use crate::geometry::{DisplaySize, Point, Rect};
use crate::widget::WidgetState;

/// Cadence and geometry for one tracking session.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// How often to poll while waiting for the first face.
    pub poll_interval: Duration,
    /// Cycle cadence once a face has been found.
    pub frame_interval: Duration,
    pub display: DisplaySize,
    /// Center of the eye widget on screen, captured at session start.
    pub eyes_center: Point,
}

/// Outcome of one detector call, with the box already in display space.
enum Cycle {
    Face { bounds: Rect, score: f32 },
    NoFace,
    Failed,
}

/// Drives the detect-and-gaze loop for one session.
///
/// Runs in two phases: a fixed-interval poll until the first face is found,
/// then a continuous per-frame loop that follows it. The polling interval is
/// dropped exactly once, at the moment of the first detection, and never
/// comes back even if the face is later lost. Detector errors are logged and
/// the next cycle runs regardless.
pub struct Tracker {
    detector: Arc<dyn Detector>,
    frames: Arc<dyn FrameSource>,
    bus: EventBus,
    config: TrackerConfig,
}

impl Tracker {
    pub fn new(
        detector: Arc<dyn Detector>,
        frames: Arc<dyn FrameSource>,
        bus: EventBus,
        config: TrackerConfig,
    ) -> Self {
        Self {
            detector,
            frames,
            bus,
            config,
        }
    }

    /// Start the loop on the runtime. The returned handle is the only way to
    /// stop it.
    pub fn spawn(self) -> TrackerHandle {
        TrackerHandle {
            task: tokio::spawn(self.run()),
        }
    }

    async fn run(self) {
        let mapper = GazeMapper::new(self.config.display, self.config.eyes_center);
        let mut widget = WidgetState::default();

        let mut poll = time::interval(self.config.poll_interval);
        let first = loop {
            poll.tick().await;
            if let Cycle::Face { bounds, score } = self.observe().await {
                break Cycle::Face { bounds, score };
            }
        };
        drop(poll);
        debug!("first face found, tracking");
        self.bus.publish(Event::TrackingStarted);

        let mut cycle = first;
        loop {
            match cycle {
                Cycle::Face { bounds, score } => {
                    for event in widget.apply(Some(mapper.offset(&bounds))) {
                        self.bus.publish(event);
                    }
                    self.bus.publish(Event::Spotted { bounds, score });
                }
                Cycle::NoFace => {
                    for event in widget.apply(None) {
                        self.bus.publish(event);
                    }
                }
                // transient fault, state untouched
                Cycle::Failed => {}
            }
            time::sleep(self.config.frame_interval).await;
            cycle = self.observe().await;
        }
    }

    /// Run the detector against the newest frame and rescale its box into
    /// display space.
    async fn observe(&self) -> Cycle {
        let Some(frame) = self.frames.latest() else {
            return Cycle::NoFace;
        };
        let sx = self.config.display.width / frame.width as f64;
        let sy = self.config.display.height / frame.height as f64;
        match self.detector.detect(&frame).await {
            Ok(Some(detection)) => Cycle::Face {
                bounds: detection.bounds.scaled(sx, sy),
                score: detection.score,
            },
            Ok(None) => Cycle::NoFace,
            Err(err) => {
                warn!("detector failed: {err}");
                Cycle::Failed
            }
        }
    }
}

/// Cancellation handle for a running [`Tracker`].
///
/// Aborting the task is the teardown path: once `stop` returns, no further
/// detector call will be scheduled. Dropping the handle stops the loop too,
/// so an abandoned session cannot leak a busy loop.
pub struct TrackerHandle {
    task: tokio::task::JoinHandle<()>,
}

impl TrackerHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
