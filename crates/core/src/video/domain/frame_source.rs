use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A continuously updated supply of frames: a camera, a stream, a file
/// played back frame by frame, or a folder of stills.
///
/// Frames are pulled one at a time so the caller's loop decides the pace.
pub trait FrameSource: Send {
    /// Opens the source and returns its native properties.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Next frame, or `None` once the source is exhausted.
    fn current_frame(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>>;

    /// Delivers subsequent frames at `width` x `height`. A zero dimension
    /// restores the native size.
    fn resize(&mut self, width: u32, height: u32);

    /// Releases any resources held by the source.
    fn close(&mut self);
}
