use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::overlay::domain::phase::Phase;
use crate::rendering::domain::color::Color;
use crate::shared::constants::{DEFAULT_PROGRESS_STEP, PROGRESS_MAX};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("progress step must be in (0, 100], got {0}")]
    InvalidStep(f64),
    #[error("expected one message per in-progress phase ({expected}), got {actual}")]
    PhaseMessages { expected: usize, actual: usize },
    #[error("expected one color per phase ({expected}), got {actual}")]
    PhaseColors { expected: usize, actual: usize },
    #[error("progress bar width must be positive")]
    ZeroBarWidth,
}

/// Presentation parameters for the scan overlay.
///
/// Everything here is cosmetic; none of it changes slot semantics except
/// `progress_step`, which sets how many frames each phase lasts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub progress_step: f64,
    /// Label per in-progress phase, in lifecycle order.
    pub phase_messages: Vec<String>,
    pub complete_message: String,
    pub no_subject_message: String,
    /// Bar/label color per phase, in lifecycle order (including Complete).
    pub phase_colors: Vec<Color>,
    pub label_color: Color,
    pub mesh_color: Color,
    pub mesh_weight: f32,
    pub max_bar_width: f64,
    pub bar_height: f64,
    pub bottom_margin: f64,
    /// Vertical distance between stacked per-slot rows.
    pub row_spacing: f64,
    pub label_size: f32,
    pub complete_label_size: f32,
    pub no_subject_size: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            progress_step: DEFAULT_PROGRESS_STEP,
            phase_messages: vec![
                "SCANNING FACE...".to_string(),
                "GATHERING DATA...".to_string(),
            ],
            complete_message: "SCAN COMPLETE".to_string(),
            no_subject_message: "NO FACE DETECTED".to_string(),
            phase_colors: vec![Color::SCAN_GREEN, Color::YELLOW, Color::WHITE],
            label_color: Color::WHITE,
            mesh_color: Color::SCAN_GREEN.with_alpha(150),
            mesh_weight: 0.5,
            max_bar_width: 300.0,
            bar_height: 10.0,
            bottom_margin: 60.0,
            row_spacing: 40.0,
            label_size: 12.0,
            complete_label_size: 16.0,
            no_subject_size: 24.0,
        }
    }
}

impl OverlayStyle {
    pub fn validate(&self) -> Result<(), StyleError> {
        let step = self.progress_step;
        if !step.is_finite() || step <= 0.0 || step > PROGRESS_MAX {
            return Err(StyleError::InvalidStep(step));
        }
        let in_progress = Phase::ALL.iter().filter(|p| !p.is_terminal()).count();
        if self.phase_messages.len() != in_progress {
            return Err(StyleError::PhaseMessages {
                expected: in_progress,
                actual: self.phase_messages.len(),
            });
        }
        if self.phase_colors.len() != Phase::ALL.len() {
            return Err(StyleError::PhaseColors {
                expected: Phase::ALL.len(),
                actual: self.phase_colors.len(),
            });
        }
        if self.max_bar_width.is_nan() || self.max_bar_width <= 0.0 {
            return Err(StyleError::ZeroBarWidth);
        }
        Ok(())
    }

    /// Label for an in-progress phase; the terminal message for Complete.
    pub fn message_for(&self, phase: Phase) -> &str {
        if phase.is_terminal() {
            return &self.complete_message;
        }
        self.phase_messages
            .get(phase.ordinal())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn color_for(&self, phase: Phase) -> Color {
        self.phase_colors
            .get(phase.ordinal())
            .copied()
            .unwrap_or(self.label_color)
    }

    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let style: Self = serde_json::from_str(json)?;
        style.validate()?;
        Ok(style)
    }
}
