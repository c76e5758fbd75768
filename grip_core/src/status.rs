//! Protocol phases and the signals emitted on phase boundaries.

use serde::{Deserialize, Serialize};

/// Phase of the assessment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// Waiting for the athlete to load the board past the force threshold.
    WaitingForForce,
    Working,
    Resting,
    Finished,
}

impl Phase {
    /// Phases in which the one-second tick must be delivered.
    pub fn is_timed(self) -> bool {
        matches!(self, Phase::Working | Phase::Resting)
    }

    /// Phases in which incoming samples are recorded.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::WaitingForForce | Phase::Working | Phase::Resting
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::WaitingForForce => "waiting_for_force",
            Phase::Working => "working",
            Phase::Resting => "resting",
            Phase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cue for the audio/visual collaborator. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The current work phase ends in `end_warning_secs`.
    EndWarning,
    /// Rest is over; the next pull may start.
    CycleStart,
}
