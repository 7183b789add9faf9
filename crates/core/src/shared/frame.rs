use ndarray::{ArrayView3, ArrayViewMut3};

use crate::rendering::domain::color::Color;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Detection reads frames in detector-space (the captured resolution);
/// the overlay draws onto a frame in display-space. Both use this type.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// RGB frame filled with a single opaque color.
    pub fn blank(width: u32, height: u32, color: Color, index: usize) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&[color.r, color.g, color.b]);
        }
        Self::new(data, width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns a copy scaled to `width` x `height`, keeping the frame index.
    ///
    /// Same-size requests clone without resampling.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }
        if self.channels != 3 || width == 0 || height == 0 {
            return Self::blank(width, height, Color::BLACK, self.index);
        }
        match image::RgbImage::from_raw(self.width, self.height, self.data.clone()) {
            Some(img) => {
                let scaled = image::imageops::resize(
                    &img,
                    width,
                    height,
                    image::imageops::FilterType::Triangle,
                );
                Self::new(scaled.into_raw(), width, height, 3, self.index)
            }
            None => Self::blank(width, height, Color::BLACK, self.index),
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_blank_fills_every_pixel() {
        let frame = Frame::blank(3, 2, Color::rgb(10, 20, 30), 7);
        assert_eq!(frame.data().len(), 18);
        for px in frame.data().chunks(3) {
            assert_eq!(px, &[10, 20, 30]);
        }
        assert_eq!(frame.index(), 7);
    }

    #[test]
    fn test_as_ndarray_layout_is_height_width_channels() {
        let mut data = vec![0u8; 24]; // 2 rows x 4 cols x 3
        data[(4 + 1) * 3] = 255; // row=1, col=1, R
        let frame = Frame::new(data, 4, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 1, 0]], 255);
        assert_eq!(arr[[1, 1, 1]], 0);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::blank(2, 2, Color::BLACK, 0);
        frame.as_ndarray_mut()[[0, 1, 2]] = 128;
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }

    #[test]
    fn test_resized_changes_dimensions_and_keeps_index() {
        let frame = Frame::blank(8, 4, Color::rgb(200, 100, 50), 3);
        let scaled = frame.resized(16, 8);
        assert_eq!(scaled.width(), 16);
        assert_eq!(scaled.height(), 8);
        assert_eq!(scaled.index(), 3);
        // Uniform input stays uniform after filtering
        assert_eq!(&scaled.data()[0..3], &[200, 100, 50]);
    }

    #[test]
    fn test_resized_same_size_is_identical() {
        let frame = Frame::blank(5, 5, Color::WHITE, 0);
        let same = frame.resized(5, 5);
        assert_eq!(same.data(), frame.data());
    }

    #[test]
    fn test_with_index_overrides_index() {
        let frame = Frame::blank(1, 1, Color::BLACK, 0).with_index(42);
        assert_eq!(frame.index(), 42);
    }
}
