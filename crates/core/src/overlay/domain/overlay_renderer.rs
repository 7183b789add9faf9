use crate::overlay::domain::coordinate_mapper::CoordinateMapper;
use crate::overlay::domain::overlay_style::{OverlayStyle, StyleError};
use crate::overlay::domain::slot::Slot;
use crate::overlay::domain::slot_store::SlotStore;
use crate::rendering::domain::renderer::{Renderer, TextAlign};

/// Gap between the bottom of a progress bar and the top of its label.
const LABEL_GAP: f64 = 6.0;

/// Counts of what one `render` call drew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub wireframes: usize,
    pub bars: usize,
    pub complete_labels: usize,
    /// In-progress slots whose face had too few points for a wireframe.
    pub skipped_faces: usize,
    pub no_subject: bool,
}

/// Turns slot state into renderer primitives.
///
/// Wireframes are drawn first for every in-progress slot, then the per-slot
/// status rows so labels stay on top of the mesh. Rows stack upward from the
/// bottom of the canvas by slot index.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Result<Self, StyleError> {
        style.validate()?;
        Ok(Self { style })
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Draws the overlay for `slots` onto a canvas sized `mapper.target()`.
    pub fn render(
        &self,
        slots: &SlotStore,
        mapper: &CoordinateMapper,
        renderer: &mut dyn Renderer,
    ) -> RenderStats {
        let (canvas_w, canvas_h) = mapper.target();
        let (canvas_w, canvas_h) = (canvas_w as f64, canvas_h as f64);
        let mut stats = RenderStats::default();

        if slots.is_empty() {
            renderer.text(
                &self.style.no_subject_message,
                canvas_w / 2.0,
                (canvas_h - self.style.no_subject_size as f64) / 2.0,
                self.style.no_subject_size,
                TextAlign::Center,
                self.style.label_color,
            );
            stats.no_subject = true;
            return stats;
        }

        for (i, slot) in slots.iter().enumerate() {
            if slot.wireframe_suppressed() {
                continue;
            }
            match slot.last_known_face() {
                Some(face) if face.is_drawable() => {
                    for (a, b) in face.segments() {
                        renderer.line(
                            mapper.map(a),
                            mapper.map(b),
                            self.style.mesh_color,
                            self.style.mesh_weight,
                        );
                    }
                    stats.wireframes += 1;
                }
                Some(face) => {
                    log::debug!(
                        "Slot {i}: face has {} point(s), skipping wireframe",
                        face.len()
                    );
                    stats.skipped_faces += 1;
                }
                None => {}
            }
        }

        let bar_width = canvas_w.min(self.style.max_bar_width);
        let bar_x = (canvas_w - bar_width) / 2.0;
        for (i, slot) in slots.iter().enumerate() {
            let bar_y = self.row_top(i, canvas_h);
            if slot.is_complete() {
                self.draw_complete_label(slot, canvas_w, bar_y, renderer);
                stats.complete_labels += 1;
            } else {
                self.draw_progress_row(slot, bar_x, bar_width, bar_y, canvas_w, renderer);
                stats.bars += 1;
            }
        }
        stats
    }

    /// Top edge of the bar row for slot `index`.
    pub fn row_top(&self, index: usize, canvas_h: f64) -> f64 {
        canvas_h - self.style.bottom_margin - index as f64 * self.style.row_spacing
    }

    /// Status text for an in-progress slot, e.g. `SCANNING FACE... (42%)`.
    pub fn progress_label(&self, slot: &Slot) -> String {
        format!(
            "{} ({}%)",
            self.style.message_for(slot.phase()),
            slot.percent()
        )
    }

    fn draw_progress_row(
        &self,
        slot: &Slot,
        bar_x: f64,
        bar_width: f64,
        bar_y: f64,
        canvas_w: f64,
        renderer: &mut dyn Renderer,
    ) {
        let color = self.style.color_for(slot.phase());
        renderer.filled_rect(
            bar_x,
            bar_y,
            bar_width * slot.progress() / 100.0,
            self.style.bar_height,
            color,
        );
        renderer.text(
            &self.progress_label(slot),
            canvas_w / 2.0,
            bar_y + self.style.bar_height + LABEL_GAP,
            self.style.label_size,
            TextAlign::Center,
            self.style.label_color,
        );
    }

    fn draw_complete_label(
        &self,
        slot: &Slot,
        canvas_w: f64,
        bar_y: f64,
        renderer: &mut dyn Renderer,
    ) {
        renderer.text(
            self.style.message_for(slot.phase()),
            canvas_w / 2.0,
            bar_y,
            self.style.complete_label_size,
            TextAlign::Center,
            self.style.color_for(slot.phase()),
        );
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            style: OverlayStyle::default(),
        }
    }
}
