use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

/// On-disk form of recorded detections, keyed by frame index.
///
/// ```json
/// { "frames": { "0": [[{"x": 10.0, "y": 20.0}, {"x": 30.0, "y": 20.0}]] } }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LandmarkRecording {
    pub frames: HashMap<usize, Vec<DetectedFace>>,
}

impl LandmarkRecording {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let recording: Self = serde_json::from_str(&json)?;
        Ok(recording)
    }
}

/// Replays recorded detections by frame index instead of running a model.
///
/// Frames without an entry report no faces.
pub struct ReplayFaceDetector {
    frames: Arc<HashMap<usize, Vec<DetectedFace>>>,
}

impl ReplayFaceDetector {
    pub fn new(frames: Arc<HashMap<usize, Vec<DetectedFace>>>) -> Self {
        Self { frames }
    }

    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let recording = LandmarkRecording::load(path)?;
        log::info!(
            "Loaded {} recorded frame(s) from {}",
            recording.frames.len(),
            path.display()
        );
        Ok(Self::new(Arc::new(recording.frames)))
    }
}

impl FaceDetector for ReplayFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        Ok(self.frames.get(&frame.index()).cloned().unwrap_or_default())
    }
}
