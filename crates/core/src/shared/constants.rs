pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Progress added to a slot per frame tick; a phase spans 100 / STEP ticks.
pub const DEFAULT_PROGRESS_STEP: f64 = 0.5;

/// Upper bound of slot progress within a phase.
pub const PROGRESS_MAX: f64 = 100.0;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Most faces the landmark detector reports per frame.
pub const MAX_FACES: usize = 5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
