use crate::event::Event;
use crate::gaze::PupilOffset;

/// Eyelid pose. The eyes stay closed until a face is in view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eyelids {
    Open,
    Closed,
}

/// The widget's owned state: what the page is currently showing.
///
/// Mutation happens only through [`WidgetState::apply`], which folds one
/// tracking cycle in and reports the events presentation needs to react to.
/// Face visibility is edge-triggered; the pupil offset is re-announced on
/// every successful detection, matching how the page re-applies the
/// transform each cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    face_visible: bool,
    pupils: PupilOffset,
    eyelids: Eyelids,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            face_visible: false,
            pupils: PupilOffset::default(),
            eyelids: Eyelids::Closed,
        }
    }
}

impl WidgetState {
    pub fn face_visible(&self) -> bool {
        self.face_visible
    }

    pub fn pupils(&self) -> PupilOffset {
        self.pupils
    }

    pub fn eyelids(&self) -> Eyelids {
        self.eyelids
    }

    /// Fold one tracking cycle into the state. `Some(offset)` means a face
    /// was found at that gaze offset; `None` means no face this cycle. A
    /// lost face leaves the last offset in place.
    pub fn apply(&mut self, outcome: Option<PupilOffset>) -> Vec<Event> {
        let mut events = Vec::new();
        match outcome {
            Some(offset) => {
                if !self.face_visible {
                    self.face_visible = true;
                    self.eyelids = Eyelids::Open;
                    events.push(Event::FaceAppeared);
                }
                self.pupils = offset;
                events.push(Event::Gaze(offset));
            }
            None => {
                if self.face_visible {
                    self.face_visible = false;
                    self.eyelids = Eyelids::Closed;
                    events.push(Event::FaceLost);
                }
            }
        }
        events
    }
}
