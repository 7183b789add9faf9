use std::path::Path;

use crate::shared::frame::Frame;

/// Encodes one frame as a still image; the format follows the extension.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
