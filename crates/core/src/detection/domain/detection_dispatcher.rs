use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::detected_face::DetectedFace;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// The detector can no longer accept requests (worker exited, model gone).
    #[error("detector unavailable")]
    Unavailable,
    /// A request is already in flight.
    #[error("a detection request is already in flight")]
    Busy,
    /// The detector failed on one request.
    #[error("detection failed: {0}")]
    Failed(String),
}

pub type DetectionResult = Result<Vec<DetectedFace>, DetectionError>;

/// Asynchronous detection port.
///
/// `dispatch` hands a frame to the detector without waiting; `poll` returns
/// the completed result, if any, without blocking. Completions are
/// delivered on the caller's thread, so the slot store is only ever
/// touched from the frame loop.
///
/// At most one request may be outstanding: `dispatch` while a previous
/// request has not been polled to completion returns [`DetectionError::Busy`].
pub trait DetectionDispatcher: Send {
    fn dispatch(&mut self, frame: Frame) -> Result<(), DetectionError>;

    fn poll(&mut self) -> Option<DetectionResult>;

    fn is_in_flight(&self) -> bool;

    /// Waits up to `timeout` for the in-flight request, if any.
    ///
    /// For end of stream, when no later tick will poll again. Dispatchers
    /// that complete synchronously need no waiting, so the default polls.
    fn drain(&mut self, _timeout: Duration) -> Option<DetectionResult> {
        self.poll()
    }
}
