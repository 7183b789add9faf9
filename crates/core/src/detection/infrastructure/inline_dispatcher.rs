use crate::detection::domain::detection_dispatcher::{
    DetectionDispatcher, DetectionError, DetectionResult,
};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

/// Runs detection synchronously inside `dispatch` and holds the result
/// until the next `poll`.
///
/// Gives deterministic, frame-accurate output for offline processing,
/// where stalling the loop on inference is acceptable.
pub struct InlineDetectionDispatcher {
    detector: Box<dyn FaceDetector>,
    pending: Option<DetectionResult>,
}

impl InlineDetectionDispatcher {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector,
            pending: None,
        }
    }
}

impl DetectionDispatcher for InlineDetectionDispatcher {
    fn dispatch(&mut self, frame: Frame) -> Result<(), DetectionError> {
        if self.pending.is_some() {
            return Err(DetectionError::Busy);
        }
        let result = self
            .detector
            .detect(&frame)
            .map_err(|e| DetectionError::Failed(e.to_string()));
        self.pending = Some(result);
        Ok(())
    }

    fn poll(&mut self) -> Option<DetectionResult> {
        self.pending.take()
    }

    fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }
}
