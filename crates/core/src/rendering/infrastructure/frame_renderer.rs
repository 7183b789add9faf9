use crate::rendering::domain::color::Color;
use crate::rendering::domain::renderer::{Renderer, TextAlign};
use crate::rendering::infrastructure::bitmap_font;
use crate::shared::frame::Frame;
use crate::shared::point::Point;

/// Rasterizes overlay primitives directly into a frame's pixel buffer.
///
/// Everything is clipped to the frame. Colors with alpha below 255 are
/// blended source-over onto the existing pixels.
pub struct FrameRenderer<'a> {
    frame: &'a mut Frame,
}

impl<'a> FrameRenderer<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        let w = self.frame.width() as i64;
        let h = self.frame.height() as i64;
        let ch = self.frame.channels() as usize;
        if x < 0 || y < 0 || x >= w || y >= h || ch < 3 {
            return;
        }
        let idx = (y as usize * w as usize + x as usize) * ch;
        let data = self.frame.data_mut();
        let out = color.blend_onto([data[idx], data[idx + 1], data[idx + 2]]);
        data[idx..idx + 3].copy_from_slice(&out);
    }

    /// Fills the half-open pixel box [x0, x1) x [y0, y1), clipped.
    fn fill_box(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.frame.width() as i64);
        let y1 = y1.min(self.frame.height() as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    fn stamp(&mut self, x: i64, y: i64, brush: i64, color: Color) {
        let half = brush / 2;
        self.fill_box(x - half, y - half, x - half + brush, y - half + brush, color);
    }
}

type Segment = ((f64, f64), (f64, f64));

/// Liang-Barsky clip of the segment `a`-`b` to `(min_x, min_y, max_x, max_y)`.
///
/// Returns `None` when nothing of the segment lies inside, or when an
/// endpoint is not finite.
fn clip_segment(a: (f64, f64), b: (f64, f64), bounds: (f64, f64, f64, f64)) -> Option<Segment> {
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return None;
    }
    let (min_x, min_y, max_x, max_y) = bounds;
    // Differences of huge finite values can overflow to infinity; halving
    // both sides keeps every edge test in range.
    let dx = b.0 / 2.0 - a.0 / 2.0;
    let dy = b.1 / 2.0 - a.1 / 2.0;
    let edges = [
        (-dx, a.0 / 2.0 - min_x / 2.0),
        (dx, max_x / 2.0 - a.0 / 2.0),
        (-dy, a.1 / 2.0 - min_y / 2.0),
        (dy, max_y / 2.0 - a.1 / 2.0),
    ];

    // (t, edge that set it); the edge coordinate is exact, which the
    // interpolated one is not when the endpoints are huge.
    let mut enter: (f64, Option<usize>) = (0.0, None);
    let mut exit: (f64, Option<usize>) = (1.0, None);
    for (edge, (p, q)) in edges.into_iter().enumerate() {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > enter.0 {
                enter = (t, Some(edge));
            }
        } else if t < exit.0 {
            exit = (t, Some(edge));
        }
        if enter.0 > exit.0 {
            return None;
        }
    }

    let point = |(t, edge): (f64, Option<usize>), end: (f64, f64)| {
        let (mut x, mut y) = match edge {
            None => end,
            Some(_) => (a.0 + t * 2.0 * dx, a.1 + t * 2.0 * dy),
        };
        match edge {
            Some(0) => x = min_x,
            Some(1) => x = max_x,
            Some(2) => y = min_y,
            Some(3) => y = max_y,
            _ => {}
        }
        (x.clamp(min_x, max_x), y.clamp(min_y, max_y))
    };
    Some((point(enter, a), point(exit, b)))
}

impl Renderer for FrameRenderer<'_> {
    fn background(&mut self, color: Color) {
        let (w, h) = (self.frame.width() as i64, self.frame.height() as i64);
        self.fill_box(0, 0, w, h, color);
    }

    fn line(&mut self, from: Point, to: Point, color: Color, weight: f32) {
        let brush = (weight.round() as i64).max(1);
        // Brush overhang keeps stamps centred just off the edge visible.
        let margin = brush as f64;
        let bounds = (
            -margin,
            -margin,
            self.frame.width() as f64 + margin,
            self.frame.height() as f64 + margin,
        );
        let Some(((fx, fy), (tx, ty))) = clip_segment((from.x, from.y), (to.x, to.y), bounds)
        else {
            return;
        };
        let (mut x0, mut y0) = (fx.round() as i64, fy.round() as i64);
        let (x1, y1) = (tx.round() as i64, ty.round() as i64);

        // Bresenham
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp(x0, y0, brush, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        if !(width > 0.0 && height > 0.0) || !x.is_finite() || !y.is_finite() {
            return;
        }
        let x0 = x.round() as i64;
        let y0 = y.round() as i64;
        let x1 = (x + width).round() as i64;
        let y1 = (y + height).round() as i64;
        self.fill_box(x0, y0, x1, y1, color);
    }

    fn text(&mut self, text: &str, x: f64, y: f64, size: f32, align: TextAlign, color: Color) {
        if text.is_empty() || !x.is_finite() || !y.is_finite() {
            return;
        }
        let scale = bitmap_font::scale_for(size);
        let width = bitmap_font::measure(text, scale) as f64;
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let mut origin_x = left.round() as i64;
        let origin_y = y.round() as i64;
        let s = scale as i64;

        for c in text.chars() {
            for (col, row) in bitmap_font::lit_cells(c) {
                let px = origin_x + col as i64 * s;
                let py = origin_y + row as i64 * s;
                self.fill_box(px, py, px + s, py + s, color);
            }
            origin_x += bitmap_font::advance(scale) as i64;
        }
    }
}
