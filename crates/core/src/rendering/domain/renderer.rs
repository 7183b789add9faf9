use crate::rendering::domain::color::Color;
use crate::shared::point::Point;

/// Horizontal anchoring of text relative to its `x` coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Drawing primitives the overlay is expressed in, all in display-space.
///
/// Coordinates outside the canvas are allowed; implementations clip.
pub trait Renderer {
    fn background(&mut self, color: Color);

    fn line(&mut self, from: Point, to: Point, color: Color, weight: f32);

    fn filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);

    /// `y` is the top edge of the text line; `size` is its height in pixels.
    fn text(&mut self, text: &str, x: f64, y: f64, size: f32, align: TextAlign, color: Color);
}
