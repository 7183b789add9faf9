use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for scan-run events: per-frame progress, stage timings and
/// gauges such as the live slot count.
///
/// Keeps the use case free of any particular output mechanism.
pub trait PipelineLogger: Send {
    /// `total` is 0 for live sources of unknown length.
    fn progress(&mut self, current: usize, total: usize);

    /// How long a named stage (`read`, `tick`, `render`, `write`) took
    /// for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A point-in-time gauge, e.g. `slots` or `detections_in_flight`.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. For tests and embedding hosts with their own UI.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Series {
    count: usize,
    sum: f64,
    max: f64,
}

impl Series {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Reports through the `log` facade, throttling progress lines to every
/// `throttle_frames` frames and aggregating timings for a final summary.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    start_time: Instant,
    frames_seen: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            messages: Vec::new(),
        }
    }

    /// Whether a progress line is due for frame `current`.
    fn should_report(&self, current: usize, total: usize) -> bool {
        current % self.throttle_frames == 0 || (total > 0 && current == total)
    }

    /// Formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Scan summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for (stage, series) in &self.timings {
            lines.push(format!(
                "  {stage:8}: avg {:6.2}ms  max {:7.2}ms  total {:7.0}ms",
                series.mean(),
                series.max,
                series.sum
            ));
        }
        for (name, series) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.1}  max {:.0}",
                series.mean(),
                series.max
            ));
        }
        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_mean(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(Series::mean)
    }

    pub fn timing_count(&self, stage: &str) -> usize {
        self.timings.get(stage).map_or(0, |s| s.count)
    }

    pub fn metric_max(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(|s| s.max)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = self.frames_seen.max(current);
        if !self.should_report(current, total) {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Scanning: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Scanning: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
