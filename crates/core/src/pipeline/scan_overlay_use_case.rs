use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::overlay::domain::coordinate_mapper::CoordinateMapper;
use crate::rendering::domain::color::Color;
use crate::rendering::infrastructure::frame_renderer::FrameRenderer;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_tick_controller::FrameTickController;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Consecutive read failures after which the source is considered gone.
const MAX_CONSECUTIVE_READ_ERRORS: usize = 30;

/// How long the end of a run waits for a detection still in flight.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Called after every frame with `(frames_done, total_frames)`; returning
/// `false` stops the run.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// How a scan run ended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub frames: usize,
    pub dispatches: usize,
    pub completed: usize,
    pub final_slots: usize,
    pub read_errors: usize,
    pub detector_available: bool,
    pub cancelled: bool,
}

/// Plays a frame source through the scan overlay and writes every rendered
/// canvas.
///
/// Each frame is scaled to the display size to form the canvas background;
/// the unscaled frame goes to detection. A failed read reuses the last good
/// frame as background and skips detection for that tick. This is a
/// single-use struct: `execute` consumes the owned components.
pub struct ScanOverlayUseCase {
    source: Option<Box<dyn FrameSource>>,
    writer: Option<Box<dyn VideoWriter>>,
    controller: FrameTickController,
    logger: Box<dyn PipelineLogger>,
    display_size: Option<(u32, u32)>,
    detection_size: Option<(u32, u32)>,
    max_frames: Option<usize>,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
}

impl ScanOverlayUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        writer: Box<dyn VideoWriter>,
        controller: FrameTickController,
    ) -> Self {
        Self {
            source: Some(source),
            writer: Some(writer),
            controller,
            logger: Box::new(NullPipelineLogger),
            display_size: None,
            detection_size: None,
            max_frames: None,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Canvas size; defaults to the source's native size.
    pub fn with_display_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.display_size = size;
        self
    }

    /// Size frames are decoded at, and so the size detection runs on.
    /// Defaults to the native size; the canvas keeps the display size.
    pub fn with_detection_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.detection_size = size;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn controller(&self) -> &FrameTickController {
        &self.controller
    }

    pub fn execute(
        &mut self,
        input: &Path,
        output: &Path,
    ) -> Result<ScanSummary, Box<dyn std::error::Error>> {
        let mut source = self.source.take().ok_or("Scan already executed")?;
        let mut writer = self.writer.take().ok_or("Scan already executed")?;

        let source_meta = source.open(input)?;
        let native = (source_meta.width, source_meta.height);
        let display = self.display_size.unwrap_or(native);
        let detection = match self.detection_size {
            Some((w, h)) => {
                source.resize(w, h);
                (w, h)
            }
            None => native,
        };
        let mut mapper = CoordinateMapper::new(detection, display)?;

        let total = match self.max_frames {
            Some(max) if source_meta.is_live() => max,
            Some(max) => max.min(source_meta.total_frames),
            None => source_meta.total_frames,
        };
        let canvas_meta = VideoMetadata {
            width: display.0,
            height: display.1,
            fps: source_meta.fps,
            total_frames: total,
            codec: String::new(),
            source_path: source_meta.source_path.clone(),
        };
        writer.open(output, &canvas_meta)?;
        self.logger.info(&format!(
            "Scanning {} ({}x{}) onto a {}x{} canvas",
            input.display(),
            source_meta.width,
            source_meta.height,
            display.0,
            display.1
        ));

        let result = self.run_loop(source.as_mut(), writer.as_mut(), &mut mapper, display, total);

        source.close();
        let close_result = writer.close();
        let summary = result?;
        close_result?;

        self.logger.summary();
        Ok(summary)
    }

    fn run_loop(
        &mut self,
        source: &mut dyn FrameSource,
        writer: &mut dyn VideoWriter,
        mapper: &mut CoordinateMapper,
        display: (u32, u32),
        total: usize,
    ) -> Result<ScanSummary, Box<dyn std::error::Error>> {
        let mut summary = ScanSummary::default();
        let mut last_good: Option<Frame> = None;
        let mut consecutive_errors = 0usize;

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                summary.cancelled = true;
                break;
            }
            if self.max_frames.is_some_and(|max| summary.frames >= max) {
                break;
            }

            let t0 = Instant::now();
            let fresh = match source.current_frame() {
                None => break,
                Some(Ok(frame)) => {
                    consecutive_errors = 0;
                    last_good = Some(frame.clone());
                    Some(frame)
                }
                Some(Err(e)) => {
                    summary.read_errors += 1;
                    consecutive_errors += 1;
                    log::warn!("Frame read failed: {e}");
                    if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        log::warn!(
                            "Frame source unavailable after {consecutive_errors} failed reads"
                        );
                        break;
                    }
                    None
                }
            };
            self.logger
                .timing("read", t0.elapsed().as_secs_f64() * 1000.0);

            if let Some(frame) = &fresh {
                if (frame.width(), frame.height()) != mapper.source() {
                    *mapper = CoordinateMapper::new((frame.width(), frame.height()), display)?;
                }
            }

            let mut canvas = match &last_good {
                Some(frame) => frame.resized(display.0, display.1),
                None => Frame::blank(display.0, display.1, Color::BLACK, 0),
            }
            .with_index(summary.frames);

            let t0 = Instant::now();
            self.controller.advance(fresh);
            self.logger
                .timing("tick", t0.elapsed().as_secs_f64() * 1000.0);

            let t0 = Instant::now();
            self.controller
                .render(mapper, &mut FrameRenderer::new(&mut canvas));
            self.logger
                .timing("render", t0.elapsed().as_secs_f64() * 1000.0);

            let t0 = Instant::now();
            writer.write(&canvas)?;
            self.logger
                .timing("write", t0.elapsed().as_secs_f64() * 1000.0);

            summary.frames += 1;
            self.logger
                .metric("slots", self.controller.slots().len() as f64);
            self.logger.metric(
                "detections_in_flight",
                if self.controller.is_detection_in_flight() {
                    1.0
                } else {
                    0.0
                },
            );
            self.logger.progress(summary.frames, total);

            if let Some(cb) = &self.on_progress {
                if !cb(summary.frames, total) {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        if !summary.cancelled {
            self.controller.finish(DRAIN_TIMEOUT);
        }

        summary.dispatches = self.controller.dispatch_count();
        summary.completed = self.controller.completed_count();
        summary.final_slots = self.controller.slots().len();
        summary.detector_available = self.controller.is_detector_available();
        Ok(summary)
    }
}
