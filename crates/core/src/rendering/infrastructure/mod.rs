pub mod bitmap_font;
pub mod frame_renderer;
pub mod recording_renderer;
