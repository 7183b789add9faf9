mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facescan_core::detection::domain::detection_dispatcher::DetectionDispatcher;
use facescan_core::detection::domain::face_detector::FaceDetector;
use facescan_core::detection::infrastructure::inline_dispatcher::InlineDetectionDispatcher;
use facescan_core::detection::infrastructure::model_resolver::ModelResolver;
use facescan_core::detection::infrastructure::onnx_landmark_detector::OnnxLandmarkDetector;
use facescan_core::detection::infrastructure::replay_face_detector::ReplayFaceDetector;
use facescan_core::detection::infrastructure::threaded_dispatcher::ThreadedDetectionDispatcher;
use facescan_core::overlay::domain::overlay_renderer::OverlayRenderer;
use facescan_core::overlay::domain::overlay_style::OverlayStyle;
use facescan_core::pipeline::frame_tick_controller::FrameTickController;
use facescan_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facescan_core::pipeline::scan_overlay_use_case::ScanOverlayUseCase;
use facescan_core::shared::constants::{
    IMAGE_EXTENSIONS, MAX_FACES, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facescan_core::video::domain::frame_source::FrameSource;
use facescan_core::video::domain::video_writer::VideoWriter;
use facescan_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use facescan_core::video::infrastructure::ffmpeg_video_writer::FfmpegVideoWriter;
use facescan_core::video::infrastructure::image_file_writer::ImageSequenceWriter;
use facescan_core::video::infrastructure::image_frame_source::ImageFrameSource;

use settings::{DetectionMode, Settings};

/// Overlays per-face scan progress on videos, streams and images.
#[derive(Parser)]
#[command(name = "facescan")]
struct Cli {
    /// Input video, image, image directory, or stream URL.
    input: PathBuf,

    /// Output video file, image file, or directory for numbered frames
    /// (required unless --write-style is used).
    output: Option<PathBuf>,

    /// Canvas size as WIDTHxHEIGHT (default: source size).
    #[arg(long, value_parser = parse_size)]
    display_size: Option<(u32, u32)>,

    /// Decode frames at WIDTHxHEIGHT for detection (default: source size).
    /// Smaller sizes speed up inference; the canvas keeps the display size.
    #[arg(long, value_parser = parse_size)]
    detection_size: Option<(u32, u32)>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Detection mode: async (worker thread) or inline (frame-accurate).
    #[arg(long, value_enum)]
    detection: Option<DetectionMode>,

    /// Replay landmarks from a JSON recording instead of running the model.
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Overlay style JSON (overrides saved settings).
    #[arg(long)]
    style: Option<PathBuf>,

    /// Progress added per frame, in percent of a phase.
    #[arg(long)]
    step: Option<f64>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Write the effective style as JSON to this path and exit.
    #[arg(long)]
    write_style: Option<PathBuf>,

    /// Persist the effective confidence, detection mode and style.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = effective_settings(&cli, Settings::load())?;
    if cli.save_settings {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    if let Some(path) = &cli.write_style {
        std::fs::write(path, serde_json::to_string_pretty(&settings.style)?)?;
        log::info!("Style written to {}", path.display());
        return Ok(());
    }
    let output = cli.output.as_deref().ok_or("Output path is required")?;

    let detector = build_detector(&cli, &settings)?;
    let dispatcher = build_dispatcher(settings.detection, detector)?;
    let overlay = OverlayRenderer::new(settings.style)?;
    let controller = FrameTickController::new(dispatcher, overlay)?;

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        if total > 0 {
            eprint!("\rScanning frame {current}/{total}");
        } else {
            eprint!("\rScanning frame {current}");
        }
        true
    });

    let mut use_case = ScanOverlayUseCase::new(open_source(&cli.input), open_writer(output), controller)
        .with_logger(Box::new(StdoutPipelineLogger::default()))
        .with_display_size(cli.display_size)
        .with_detection_size(cli.detection_size)
        .with_max_frames(cli.max_frames)
        .with_progress(progress);
    let summary = use_case.execute(&cli.input, output)?;
    eprintln!();

    if !summary.detector_available {
        log::warn!("Detector stopped during the run; later frames show the last known state");
    }
    log::info!(
        "{} frame(s) written to {} ({} detection(s), {} face slot(s) at end)",
        summary.frames,
        output.display(),
        summary.completed,
        summary.final_slots
    );
    Ok(())
}

/// Saved settings overlaid with command-line overrides.
fn effective_settings(
    cli: &Cli,
    mut settings: Settings,
) -> Result<Settings, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.style {
        settings.style = OverlayStyle::from_json(&std::fs::read_to_string(path)?)?;
    }
    if let Some(step) = cli.step {
        settings.style.progress_step = step;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(mode) = cli.detection {
        settings.detection = mode;
    }
    settings.style.validate()?;
    Ok(settings)
}

fn build_detector(
    cli: &Cli,
    settings: &Settings,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.landmarks {
        return Ok(Box::new(ReplayFaceDetector::from_file(path)?));
    }

    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = ModelResolver::new()?.resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let detector =
        OnnxLandmarkDetector::new(&model_path, settings.confidence)?.with_max_faces(MAX_FACES);
    Ok(Box::new(detector))
}

fn build_dispatcher(
    mode: DetectionMode,
    detector: Box<dyn FaceDetector>,
) -> Result<Box<dyn DetectionDispatcher>, Box<dyn std::error::Error>> {
    Ok(match mode {
        DetectionMode::Async => Box::new(ThreadedDetectionDispatcher::spawn(detector)?),
        DetectionMode::Inline => Box::new(InlineDetectionDispatcher::new(detector)),
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !is_stream_url(&cli.input) && !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.write_style.is_none() && cli.output.is_none() {
        return Err("Output path is required unless --write-style is used".into());
    }
    if let Some(confidence) = cli.confidence {
        if !settings::is_valid_confidence(confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {confidence}"
            )
            .into());
        }
    }
    if let Some(step) = cli.step {
        if !step.is_finite() || step <= 0.0 || step > 100.0 {
            return Err(format!("Step must be in (0, 100], got {step}").into());
        }
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    if let Some(path) = &cli.landmarks {
        if !path.exists() {
            return Err(format!("Landmarks file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

fn is_stream_url(path: &Path) -> bool {
    path.to_str().is_some_and(|s| s.contains("://"))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_source(input: &Path) -> Box<dyn FrameSource> {
    if input.is_dir() || is_image(input) {
        Box::new(ImageFrameSource::new())
    } else {
        Box::new(FfmpegFrameSource::new())
    }
}

/// Image paths and extensionless paths (frame directories) get still
/// images; everything else is encoded as video.
fn writes_images(output: &Path) -> bool {
    output.is_dir() || output.extension().is_none() || is_image(output)
}

fn open_writer(output: &Path) -> Box<dyn VideoWriter> {
    if writes_images(output) {
        Box::new(ImageSequenceWriter::default())
    } else {
        Box::new(FfmpegVideoWriter::new())
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face landmark model... {pct}%");
    } else {
        eprint!("\rDownloading face landmark model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("facescan").chain(args.iter().copied())).unwrap()
    }

    #[rstest]
    #[case("640x480", Ok((640, 480)))]
    #[case("1280X720", Ok((1280, 720)))]
    #[case(" 320 x 240 ", Ok((320, 240)))]
    fn test_parse_size_accepts(#[case] input: &str, #[case] expected: Result<(u32, u32), ()>) {
        assert_eq!(parse_size(input).ok(), expected.ok());
    }

    #[rstest]
    #[case("640")]
    #[case("0x480")]
    #[case("abcx10")]
    #[case("10x")]
    fn test_parse_size_rejects(#[case] input: &str) {
        assert!(parse_size(input).is_err());
    }

    #[rstest]
    #[case("out.mp4", false)]
    #[case("out.mkv", false)]
    #[case("out.png", true)]
    #[case("frames", true)]
    fn test_writes_images(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(writes_images(Path::new(path)), expected);
    }

    #[test]
    fn test_detection_size_is_parsed() {
        let c = cli(&["in.mp4", "out.mp4", "--detection-size", "320x240"]);
        assert_eq!(c.detection_size, Some((320, 240)));
        assert!(Cli::try_parse_from(["facescan", "in.mp4", "--detection-size", "0x240"]).is_err());
    }

    #[test]
    fn test_stream_urls_skip_existence_check() {
        assert!(is_stream_url(Path::new("rtsp://camera.local/live")));
        assert!(!is_stream_url(Path::new("clip.mp4")));

        let c = cli(&["rtsp://camera.local/live", "out.mp4"]);
        assert!(validate(&c).is_ok());
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let c = cli(&["/nonexistent/clip.mp4", "out.mp4"]);
        assert!(validate(&c).is_err());
    }

    #[test]
    fn test_output_required_unless_writing_style() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(validate(&cli(&[input])).is_err());
        assert!(validate(&cli(&[input, "--write-style", "style.json"])).is_ok());
    }

    #[rstest]
    #[case(&["--confidence", "1.5"])]
    #[case(&["--step", "0"])]
    #[case(&["--step", "101"])]
    #[case(&["--max-frames", "0"])]
    #[case(&["--landmarks", "/nonexistent/landmarks.json"])]
    fn test_invalid_flags_are_rejected(#[case] flags: &[&str]) {
        let dir = tempfile::tempdir().unwrap();
        let mut args = vec![dir.path().to_str().unwrap(), "out.mp4"];
        args.extend_from_slice(flags);
        assert!(validate(&cli(&args)).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let dir = tempfile::tempdir().unwrap();
        let c = cli(&[
            dir.path().to_str().unwrap(),
            "out.mp4",
            "--step",
            "2",
            "--confidence",
            "0.8",
            "--detection",
            "inline",
        ]);
        let settings = effective_settings(&c, Settings::default()).unwrap();
        assert_eq!(settings.style.progress_step, 2.0);
        assert_eq!(settings.confidence, 0.8);
        assert_eq!(settings.detection, DetectionMode::Inline);
    }

    #[test]
    fn test_style_file_replaces_saved_style() {
        let dir = tempfile::tempdir().unwrap();
        let style_path = dir.path().join("style.json");
        std::fs::write(&style_path, r#"{"complete_message": "DONE"}"#).unwrap();

        let c = cli(&[
            dir.path().to_str().unwrap(),
            "out.mp4",
            "--style",
            style_path.to_str().unwrap(),
        ]);
        let settings = effective_settings(&c, Settings::default()).unwrap();
        assert_eq!(settings.style.complete_message, "DONE");
        assert_eq!(settings.style.no_subject_message, "NO FACE DETECTED");
    }
}
