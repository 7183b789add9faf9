use crate::detection::domain::detected_face::DetectedFace;
use crate::overlay::domain::phase::Phase;

/// Lifecycle record for one tracked subject.
///
/// Bound to a detection by batch position only: slot `i` follows whichever
/// face the detector reports at index `i`. Reordering in the detector's
/// output moves progress to a different person.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    progress: f64,
    phase: Phase,
    last_known_face: Option<DetectedFace>,
}

impl Slot {
    pub fn new() -> Self {
        Self {
            progress: 0.0,
            phase: Phase::Scanning,
            last_known_face: None,
        }
    }

    /// Progress within the current phase, in `[0, 100]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_known_face(&self) -> Option<&DetectedFace> {
        self.last_known_face.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The mesh is hidden once the scan finished; the face data itself is
    /// left untouched.
    pub fn wireframe_suppressed(&self) -> bool {
        self.is_complete()
    }

    /// Whole percent shown to the user (floor of progress).
    pub fn percent(&self) -> u32 {
        self.progress.floor() as u32
    }

    pub(crate) fn set_last_known_face(&mut self, face: DetectedFace) {
        self.last_known_face = Some(face);
    }

    pub(crate) fn set_state(&mut self, phase: Phase, progress: f64) {
        debug_assert!(phase >= self.phase, "phase must never regress");
        self.phase = phase;
        self.progress = progress;
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}
