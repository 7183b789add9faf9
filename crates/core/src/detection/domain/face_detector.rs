use crate::detection::domain::detected_face::DetectedFace;
use crate::shared::frame::Frame;

/// Domain interface for face-landmark detection.
///
/// Returns every face found in the frame, each as an ordered landmark list
/// in the frame's own coordinates. `Send` so implementations can run on a
/// detection worker thread; `&mut self` because inference sessions are
/// stateful.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
