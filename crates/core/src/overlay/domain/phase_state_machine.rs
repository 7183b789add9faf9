use crate::overlay::domain::overlay_style::StyleError;
use crate::overlay::domain::slot::Slot;
use crate::overlay::domain::slot_store::SlotStore;
use crate::shared::constants::{DEFAULT_PROGRESS_STEP, PROGRESS_MAX};

/// Fixed-duration phase timer.
///
/// Every tick adds `step` to a slot's progress; reaching 100 moves the slot
/// to the next phase and restarts progress at 0. Progress depends only on
/// elapsed ticks, never on detection quality.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseStateMachine {
    step: f64,
}

impl PhaseStateMachine {
    pub fn new(step: f64) -> Result<Self, StyleError> {
        if !step.is_finite() || step <= 0.0 || step > PROGRESS_MAX {
            return Err(StyleError::InvalidStep(step));
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Nominal ticks a phase lasts, `100 / step` rounded up.
    ///
    /// Exact when `step` is exact in binary (0.5, 0.25, 2.0, ...). For other
    /// steps rounding in the running sum and in the division can make the
    /// real phase one tick longer or shorter (step 0.1 takes 1001 ticks,
    /// not 1000).
    pub fn ticks_per_phase(&self) -> u32 {
        (PROGRESS_MAX / self.step).ceil() as u32
    }

    /// Advances one slot by one tick. Returns `true` if the phase changed.
    ///
    /// Terminal slots are left untouched.
    pub fn advance(&self, slot: &mut Slot) -> bool {
        if slot.is_complete() {
            return false;
        }
        let progress = (slot.progress() + self.step).clamp(0.0, PROGRESS_MAX);
        if progress >= PROGRESS_MAX {
            slot.set_state(slot.phase().next(), 0.0);
            true
        } else {
            slot.set_state(slot.phase(), progress);
            false
        }
    }

    /// Advances every non-terminal slot by one tick. Returns the number of
    /// phase transitions.
    pub fn tick_all(&self, store: &mut SlotStore) -> usize {
        store
            .iter_mut()
            .filter(|slot| !slot.is_complete())
            .map(|slot| self.advance(slot))
            .filter(|&changed| changed)
            .count()
    }
}

impl Default for PhaseStateMachine {
    fn default() -> Self {
        Self {
            step: DEFAULT_PROGRESS_STEP,
        }
    }
}
