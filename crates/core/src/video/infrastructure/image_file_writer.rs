use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_writer::VideoWriter;

/// Writes a frame to an image file using the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(path)?;
        Ok(())
    }
}

/// Where an [`ImageSequenceWriter`] puts its frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageTarget {
    /// Every frame overwrites the same file, so the last one remains.
    SingleFile(PathBuf),
    /// One numbered PNG per frame inside the directory.
    Directory(PathBuf),
}

impl ImageTarget {
    /// Paths with an image extension are single files; anything else is a
    /// directory of frames.
    pub fn for_path(path: &Path) -> Self {
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                crate::shared::constants::IMAGE_EXTENSIONS
                    .contains(&ext.to_ascii_lowercase().as_str())
            });
        if is_image {
            ImageTarget::SingleFile(path.to_path_buf())
        } else {
            ImageTarget::Directory(path.to_path_buf())
        }
    }
}

/// Adapts an [`ImageWriter`] to the [`VideoWriter`] interface.
pub struct ImageSequenceWriter {
    image_writer: Box<dyn ImageWriter>,
    target: Option<ImageTarget>,
    written: usize,
}

impl ImageSequenceWriter {
    pub fn new(image_writer: Box<dyn ImageWriter>) -> Self {
        Self {
            image_writer,
            target: None,
            written: 0,
        }
    }

    pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
        dir.join(format!("frame_{index:06}.png"))
    }
}

impl Default for ImageSequenceWriter {
    fn default() -> Self {
        Self::new(Box::new(ImageFileWriter::new()))
    }
}

impl VideoWriter for ImageSequenceWriter {
    fn open(
        &mut self,
        path: &Path,
        _metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let target = ImageTarget::for_path(path);
        if let ImageTarget::Directory(dir) = &target {
            std::fs::create_dir_all(dir)?;
        }
        self.target = Some(target);
        self.written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let path = match self
            .target
            .as_ref()
            .ok_or("ImageSequenceWriter: not opened")?
        {
            ImageTarget::SingleFile(path) => path.clone(),
            ImageTarget::Directory(dir) => Self::frame_path(dir, frame.index()),
        };
        self.image_writer.write(&path, frame)?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.target.take().is_some() {
            log::debug!("Wrote {} image(s)", self.written);
        }
        Ok(())
    }
}
