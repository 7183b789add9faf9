use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sink for rendered canvases.
///
/// `metadata` describes the canvas (display-space size and frame rate),
/// not the source it was rendered from.
pub trait VideoWriter: Send {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes pending output. Safe to call more than once.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
