//! # System Schedules
//!
//! A system with interval `I` and offset `O` runs on frame `F` exactly when
//! `(F - O) mod I == 0`. The modulus is Euclidean, so offsets larger than
//! the frame number still gate correctly.

use serde::Deserialize;

/// Interval gating for one system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Run every `interval` frames. Must be at least 1.
    pub interval: u32,
    /// Phase shift of the interval.
    pub offset: u32,
}

impl Schedule {
    /// Runs on every frame.
    pub const EVERY_FRAME: Self = Self {
        interval: 1,
        offset: 0,
    };

    /// Creates a schedule.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub const fn new(interval: u32, offset: u32) -> Self {
        assert!(interval > 0, "Interval must be greater than zero");
        Self { interval, offset }
    }

    /// Checks whether the system runs on `frame`.
    ///
    /// A zero interval never runs.
    #[inline]
    #[must_use]
    pub fn runs_on(self, frame: u64) -> bool {
        if self.interval == 0 {
            return false;
        }
        let shifted = i128::from(frame) - i128::from(self.offset);
        shifted.rem_euclid(i128::from(self.interval)) == 0
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::EVERY_FRAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_frame() {
        assert!((0..10).all(|f| Schedule::EVERY_FRAME.runs_on(f)));
    }

    #[test]
    fn test_interval_and_offset() {
        let schedule = Schedule::new(4, 1);
        let runs: Vec<u64> = (0..12).filter(|&f| schedule.runs_on(f)).collect();
        assert_eq!(runs, vec![1, 5, 9]);
    }

    #[test]
    fn test_offset_beyond_interval() {
        // (F - 7) mod 3 == 0  <=>  F mod 3 == 1
        let schedule = Schedule::new(3, 7);
        let runs: Vec<u64> = (0..9).filter(|&f| schedule.runs_on(f)).collect();
        assert_eq!(runs, vec![1, 4, 7]);
    }

    #[test]
    fn test_large_frames() {
        let schedule = Schedule::new(5, 2);
        assert!(schedule.runs_on(u64::MAX - (u64::MAX - 2) % 5));
        assert!(!Schedule::new(2, 0).runs_on(u64::MAX));
    }

    #[test]
    #[should_panic(expected = "Interval must be greater than zero")]
    fn test_zero_interval_panics() {
        let _ = Schedule::new(0, 0);
    }
}
