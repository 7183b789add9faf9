use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use facescan_core::overlay::domain::overlay_style::OverlayStyle;
use facescan_core::shared::constants::DEFAULT_CONFIDENCE;
use serde::{Deserialize, Serialize};

/// How detection runs relative to the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Worker thread; the loop never waits for inference.
    Async,
    /// Detect inside the loop; every result lands on the frame it came from.
    Inline,
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMode::Async => write!(f, "async"),
            DetectionMode::Inline => write!(f, "inline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub confidence: f64,
    pub detection: DetectionMode,
    pub style: OverlayStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            detection: DetectionMode::Async,
            style: OverlayStyle::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceScan").join("settings.json"))
    }

    /// Settings from the user config, or defaults when missing or malformed.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&json) {
            Ok(mut settings) if settings.style.validate().is_ok() => {
                if !is_valid_confidence(settings.confidence) {
                    log::warn!(
                        "Ignoring confidence {} in {}; using {DEFAULT_CONFIDENCE}",
                        settings.confidence,
                        path.display()
                    );
                    settings.confidence = DEFAULT_CONFIDENCE;
                }
                settings
            }
            Ok(_) => {
                log::warn!("Ignoring invalid style in {}", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = Self::config_path().ok_or("Cannot determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Detection confidence thresholds live in [0, 1].
pub fn is_valid_confidence(confidence: f64) -> bool {
    (0.0..=1.0).contains(&confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Settings::load_from(&dir.path().join("nope.json")),
            Settings::default()
        );
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_invalid_style_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"style": {"progress_step": 0}}"#).unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FaceScan").join("settings.json");
        let mut settings = Settings {
            confidence: 0.7,
            detection: DetectionMode::Inline,
            ..Settings::default()
        };
        settings.style.progress_step = 1.0;

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"detection": "inline"}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.detection, DetectionMode::Inline);
        assert_eq!(settings.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(settings.style, OverlayStyle::default());
    }

    #[test]
    fn test_out_of_range_confidence_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"confidence": 5.0, "detection": "inline", "style": {"progress_step": 2.0}}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(settings.detection, DetectionMode::Inline);
        assert_eq!(settings.style.progress_step, 2.0);
    }

    #[test]
    fn test_confidence_range() {
        assert!(is_valid_confidence(0.0));
        assert!(is_valid_confidence(1.0));
        assert!(!is_valid_confidence(-0.1));
        assert!(!is_valid_confidence(1.5));
        assert!(!is_valid_confidence(f64::NAN));
    }
}
