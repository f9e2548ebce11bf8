//! Global match state, stored as a singleton table.

use bytemuck::{Pod, Zeroable};

/// Stage of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    /// Pre-match countdown is running.
    Countdown,
    /// Gameplay is running.
    Running,
    /// The match has ended.
    Finished,
}

impl MatchPhase {
    /// Decodes the stored value; unknown values read as `Finished`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Countdown,
            1 => Self::Running,
            _ => Self::Finished,
        }
    }

    /// Encodes the phase for storage.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::Countdown => 0,
            Self::Running => 1,
            Self::Finished => 2,
        }
    }
}

/// Winner value meaning "no winner yet".
pub const NO_WINNER: u32 = u32::MAX;

/// The singleton row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct MatchState {
    /// Stored [`MatchPhase`].
    pub phase: u32,
    /// Countdown frames left before the match starts.
    pub countdown_frames: u32,
    /// Number of waves spawned so far.
    pub wave: u32,
    /// Winning player, or [`NO_WINNER`].
    pub winner: u32,
}

impl MatchState {
    /// Initial state for a match with the given countdown.
    #[must_use]
    pub const fn starting(countdown_frames: u32) -> Self {
        let phase = if countdown_frames == 0 {
            MatchPhase::Running
        } else {
            MatchPhase::Countdown
        };
        Self {
            phase: phase.as_raw(),
            countdown_frames,
            wave: 0,
            winner: NO_WINNER,
        }
    }

    /// Returns the decoded phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        MatchPhase::from_raw(self.phase)
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::starting(0)
    }
}
