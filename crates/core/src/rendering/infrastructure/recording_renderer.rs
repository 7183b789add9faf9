use crate::rendering::domain::color::Color;
use crate::rendering::domain::renderer::{Renderer, TextAlign};
use crate::shared::point::Point;

/// One recorded primitive call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Background(Color),
    Line {
        from: Point,
        to: Point,
        color: Color,
        weight: f32,
    },
    FilledRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f32,
        align: TextAlign,
        color: Color,
    },
}

/// Renderer that records calls instead of drawing.
///
/// Lets headless hosts and tests inspect exactly what a frame would show.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count()
    }

    pub fn rects(&self) -> Vec<(f64, f64, f64, f64)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::FilledRect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => Some((x, y, width, height)),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn background(&mut self, color: Color) {
        self.commands.push(DrawCommand::Background(color));
    }

    fn line(&mut self, from: Point, to: Point, color: Color, weight: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            weight,
        });
    }

    fn filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.commands.push(DrawCommand::FilledRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn text(&mut self, text: &str, x: f64, y: f64, size: f32, align: TextAlign, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            size,
            align,
            color,
        });
    }
}
