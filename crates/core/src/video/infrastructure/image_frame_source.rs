use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Serves still images as frames: either one file, or every image in a
/// directory in lexical filename order.
///
/// Images are decoded lazily, one per `current_frame` call.
#[derive(Default)]
pub struct ImageFrameSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    output_size: Option<(u32, u32)>,
    opened: bool,
}

impl ImageFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` has one of the supported still-image extensions.
    pub fn is_image_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }

    fn collect_paths(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        if path.is_dir() {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && Self::is_image_path(p))
                .collect();
            paths.sort();
            if paths.is_empty() {
                return Err(format!("No images found in {}", path.display()).into());
            }
            Ok(paths)
        } else if path.is_file() {
            Ok(vec![path.to_path_buf()])
        } else {
            Err(format!("No such file or directory: {}", path.display()).into())
        }
    }

    fn decode(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        let frame = Frame::new(img.into_raw(), width, height, 3, index);
        Ok(match self.output_size {
            Some((w, h)) => frame.resized(w, h),
            None => frame,
        })
    }
}

impl FrameSource for ImageFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let paths = Self::collect_paths(path)?;
        let (width, height) = image::image_dimensions(&paths[0])?;

        let metadata = VideoMetadata {
            width,
            height,
            fps: 0.0,
            total_frames: paths.len(),
            codec: String::new(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!("Opened {} image(s) from {}", paths.len(), path.display());

        self.paths = paths;
        self.cursor = 0;
        self.opened = true;
        Ok(metadata)
    }

    fn current_frame(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        if !self.opened {
            return Some(Err("ImageFrameSource: not opened".into()));
        }
        let index = self.cursor;
        let path = self.paths.get(index)?;
        self.cursor += 1;
        Some(
            self.decode(path, index)
                .map_err(|e| format!("{}: {e}", path.display()).into()),
        )
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.output_size = if width == 0 || height == 0 {
            None
        } else {
            Some((width, height))
        };
    }

    fn close(&mut self) {
        self.paths.clear();
        self.cursor = 0;
        self.opened = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_single_image_yields_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "face.png", 100, 80, [50, 100, 200]);

        let mut source = ImageFrameSource::new();
        let meta = source.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (100, 80));
        assert_eq!(meta.total_frames, 1);
        assert_eq!(meta.fps, 0.0);

        let frame = source.current_frame().unwrap().unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(&frame.data()[0..3], &[50, 100, 200]);
        assert!(source.current_frame().is_none());
    }

    #[test]
    fn test_directory_is_read_in_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "b.png", 4, 4, [2, 2, 2]);
        write_image(dir.path(), "a.png", 4, 4, [1, 1, 1]);
        write_image(dir.path(), "c.png", 4, 4, [3, 3, 3]);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageFrameSource::new();
        let meta = source.open(dir.path()).unwrap();
        assert_eq!(meta.total_frames, 3);

        let firsts: Vec<u8> = std::iter::from_fn(|| source.current_frame())
            .map(|f| f.unwrap().data()[0])
            .collect();
        assert_eq!(firsts, vec![1, 2, 3]);
    }

    #[test]
    fn test_resize_scales_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "face.png", 100, 80, [9, 9, 9]);

        let mut source = ImageFrameSource::new();
        source.open(&path).unwrap();
        source.resize(50, 40);
        let frame = source.current_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (50, 40));
    }

    #[test]
    fn test_empty_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFrameSource::new().open(dir.path()).is_err());
    }

    #[test]
    fn test_current_frame_before_open_is_error() {
        assert!(matches!(
            ImageFrameSource::new().current_frame(),
            Some(Err(_))
        ));
    }

    #[rstest]
    #[case("a.png", true)]
    #[case("a.JPG", true)]
    #[case("a.webp", true)]
    #[case("a.mp4", false)]
    #[case("noext", false)]
    fn test_is_image_path(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(ImageFrameSource::is_image_path(Path::new(name)), expected);
    }
}
