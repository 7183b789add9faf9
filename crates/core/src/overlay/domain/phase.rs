use serde::{Deserialize, Serialize};

/// Scan phase of one slot. Ordering follows the lifecycle, so
/// `phase < Phase::Complete` reads as "still in progress".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Scanning,
    Gathering,
    Complete,
}

impl Phase {
    pub const ALL: &[Phase] = &[Phase::Scanning, Phase::Gathering, Phase::Complete];

    /// The following phase; `Complete` maps to itself.
    pub fn next(self) -> Phase {
        match self {
            Phase::Scanning => Phase::Gathering,
            Phase::Gathering => Phase::Complete,
            Phase::Complete => Phase::Complete,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Complete
    }

    /// Position in the lifecycle, used to index per-phase presentation tables.
    pub fn ordinal(self) -> usize {
        match self {
            Phase::Scanning => 0,
            Phase::Gathering => 1,
            Phase::Complete => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Scanning => write!(f, "Scanning"),
            Phase::Gathering => write!(f, "Gathering"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}
