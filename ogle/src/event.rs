use tokio::sync::broadcast;

use crate::boot::BootPhase;
use crate::gaze::PupilOffset;
use crate::geometry::Rect;

/// Events published while a widget session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Boot progressed to a new phase.
    Phase(BootPhase),
    /// Startup failed in a way the page should display.
    BootFailed(String),
    /// The first face was found; the tracker left its polling phase.
    TrackingStarted,
    /// A face became visible after not being so.
    FaceAppeared,
    /// The face was lost; the pupils hold their last offset.
    FaceLost,
    /// New pupil offset for both eyes.
    Gaze(PupilOffset),
    /// Display-space detection box with its confidence, for the debug
    /// overlay.
    Spotted { bounds: Rect, score: f32 },
}

/// Broadcast hub connecting the tracker to whatever renders its output.
///
/// # Examples
/// ```
/// use ogle::{Event, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
/// bus.publish(Event::FaceAppeared);
/// assert_eq!(rx.try_recv().unwrap(), Event::FaceAppeared);
/// ```
#[derive(Clone)]
pub struct EventBus {
    events: broadcast::Sender<Event>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn new() -> Self {
        let (events, _) = broadcast::channel(Self::DEFAULT_CAPACITY);
        Self { events }
    }

    /// Send an [`Event`] to all subscribers. Dropped silently when nobody
    /// listens.
    pub fn publish(&self, event: Event) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
