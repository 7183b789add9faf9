use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detection_dispatcher::{
    DetectionDispatcher, DetectionError, DetectionResult,
};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

type WorkerResult = Result<Vec<DetectedFace>, String>;

/// Runs a [`FaceDetector`] on a dedicated worker thread.
///
/// Layout: `frame loop → request channel → worker → result channel → frame loop`
///
/// Both channels hold a single message, matching the single-flight rule:
/// the loop never has more than one frame queued for inference.
pub struct ThreadedDetectionDispatcher {
    request_tx: Option<Sender<Frame>>,
    result_rx: Receiver<WorkerResult>,
    handle: Option<JoinHandle<()>>,
    in_flight: bool,
    available: bool,
}

impl ThreadedDetectionDispatcher {
    pub fn spawn(detector: Box<dyn FaceDetector>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<Frame>(1);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<WorkerResult>(1);

        let handle = std::thread::Builder::new()
            .name("face-detect".to_string())
            .spawn(move || run_worker(detector, request_rx, result_tx))?;

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            handle: Some(handle),
            in_flight: false,
            available: true,
        })
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Blocks up to `timeout` for the in-flight request to complete.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<DetectionResult> {
        if !self.in_flight {
            return None;
        }
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => Some(self.complete(result)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.worker_gone()),
        }
    }

    fn complete(&mut self, result: WorkerResult) -> DetectionResult {
        self.in_flight = false;
        result.map_err(DetectionError::Failed)
    }

    fn worker_gone(&mut self) -> DetectionResult {
        log::warn!("Detection worker exited; no further detection requests will be issued");
        self.in_flight = false;
        self.available = false;
        Err(DetectionError::Unavailable)
    }
}

fn run_worker(
    mut detector: Box<dyn FaceDetector>,
    request_rx: Receiver<Frame>,
    result_tx: Sender<WorkerResult>,
) {
    for frame in request_rx {
        let index = frame.index();
        let result = detector.detect(&frame).map_err(|e| e.to_string());
        if let Ok(ref faces) = result {
            log::debug!("Detected {} face(s) on frame {index}", faces.len());
        }
        if result_tx.send(result).is_err() {
            break;
        }
    }
}

impl DetectionDispatcher for ThreadedDetectionDispatcher {
    fn dispatch(&mut self, frame: Frame) -> Result<(), DetectionError> {
        if !self.available {
            return Err(DetectionError::Unavailable);
        }
        if self.in_flight {
            return Err(DetectionError::Busy);
        }
        let Some(tx) = self.request_tx.as_ref() else {
            return Err(DetectionError::Unavailable);
        };
        if tx.send(frame).is_err() {
            self.available = false;
            return Err(DetectionError::Unavailable);
        }
        self.in_flight = true;
        Ok(())
    }

    fn poll(&mut self) -> Option<DetectionResult> {
        if !self.in_flight {
            return None;
        }
        match self.result_rx.try_recv() {
            Ok(result) => Some(self.complete(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.worker_gone()),
        }
    }

    fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    fn drain(&mut self, timeout: Duration) -> Option<DetectionResult> {
        self.poll_timeout(timeout)
    }
}

impl Drop for ThreadedDetectionDispatcher {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.request_tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Detection worker panicked");
            }
        }
    }
}
