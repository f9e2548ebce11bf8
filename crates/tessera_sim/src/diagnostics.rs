//! # Desync Diagnostics
//!
//! Per-system hash history for bisecting cross-replica divergence.
//!
//! A frame recorded with [`Simulation::tick_with_hashes`] yields `N + 1`
//! hashes: the state after `begin_frame`, then the state after each of the
//! `N` registered systems in order. Interval-skipped systems repeat the
//! previous hash. Records live in a fixed ring keyed by `frame % window`;
//! recording a frame evicts whatever frame previously held its slot. After a
//! rollback, replayed frames overwrite their own earlier records, and may
//! evict a newer frame that shares their slot.
//!
//! [`Simulation::tick_with_hashes`]: crate::Simulation::tick_with_hashes

/// Label of hash index 0 in a recorded frame.
pub const BEGIN_FRAME_LABEL: &str = "begin_frame";

#[derive(Clone, Debug, Default)]
struct HashRecord {
    frame: Option<u64>,
    hashes: Vec<u64>,
}

/// Fixed-window ring of per-system hash arrays.
#[derive(Clone, Debug)]
pub struct DesyncRecorder {
    records: Box<[HashRecord]>,
    evictions: u64,
}

impl DesyncRecorder {
    /// Creates an empty recorder holding at most `window` frames.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    #[must_use]
    pub fn new(window: u32) -> Self {
        assert!(window > 0, "History window must be greater than zero");
        Self {
            records: (0..window).map(|_| HashRecord::default()).collect(),
            evictions: 0,
        }
    }

    /// Number of frames the ring can hold.
    #[inline]
    #[must_use]
    pub fn window(&self) -> u32 {
        self.records.len() as u32
    }

    /// Number of frames currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.frame.is_some()).count()
    }

    /// Checks if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames evicted since construction or the last [`clear`](Self::clear).
    #[inline]
    #[must_use]
    pub const fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Pre-sizes every slot for `hashes_per_frame` entries.
    pub fn reserve(&mut self, hashes_per_frame: usize) {
        for record in self.records.iter_mut() {
            let additional = hashes_per_frame.saturating_sub(record.hashes.len());
            record.hashes.reserve(additional);
        }
    }

    fn slot_of(&self, frame: u64) -> usize {
        (frame % self.records.len() as u64) as usize
    }

    /// Stores `hashes` for `frame`, replacing any older frame in its slot.
    pub fn record(&mut self, frame: u64, hashes: &[u64]) {
        let slot = self.slot_of(frame);
        let record = &mut self.records[slot];
        match record.frame {
            Some(evicted) if evicted < frame => {
                self.evictions += 1;
                tracing::warn!(evicted, frame, "Desync history full, evicting oldest frame");
            }
            Some(evicted) if evicted > frame => {
                self.evictions += 1;
                tracing::warn!(evicted, frame, "Replayed frame evicts newer desync record");
            }
            _ => {}
        }
        record.frame = Some(frame);
        record.hashes.clear();
        record.hashes.extend_from_slice(hashes);
    }

    /// Returns the hashes recorded for `frame`, if still retained.
    #[must_use]
    pub fn hashes(&self, frame: u64) -> Option<&[u64]> {
        let record = &self.records[self.slot_of(frame)];
        (record.frame == Some(frame)).then_some(record.hashes.as_slice())
    }

    /// Forgets every record. Slot capacity is kept.
    pub fn clear(&mut self) {
        for record in self.records.iter_mut() {
            record.frame = None;
            record.hashes.clear();
        }
        self.evictions = 0;
    }
}

/// Index of the first differing hash between two replicas' arrays.
///
/// If one array is a strict prefix of the other, the divergence is at the
/// end of the shorter one. Returns `None` for identical arrays.
#[must_use]
pub fn first_divergence(local: &[u64], remote: &[u64]) -> Option<usize> {
    local
        .iter()
        .zip(remote)
        .position(|(a, b)| a != b)
        .or_else(|| (local.len() != remote.len()).then_some(local.len().min(remote.len())))
}

/// Human-readable label of a hash index: [`BEGIN_FRAME_LABEL`] for 0, the
/// system name otherwise.
#[must_use]
pub fn stage_label(system_names: &[&'static str], index: usize) -> Option<&'static str> {
    match index {
        0 => Some(BEGIN_FRAME_LABEL),
        i => system_names.get(i - 1).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read() {
        let mut recorder = DesyncRecorder::new(4);
        recorder.record(10, &[1, 2, 3]);
        assert_eq!(recorder.hashes(10), Some(&[1, 2, 3][..]));
        assert_eq!(recorder.hashes(11), None);
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_oldest_frame_evicted() {
        let mut recorder = DesyncRecorder::new(4);
        for frame in 0..6 {
            recorder.record(frame, &[frame]);
        }
        assert_eq!(recorder.hashes(0), None);
        assert_eq!(recorder.hashes(1), None);
        assert_eq!(recorder.hashes(5), Some(&[5][..]));
        assert_eq!(recorder.len(), 4);
        assert_eq!(recorder.evictions(), 2);
    }

    #[test]
    fn test_rerecording_same_frame_is_not_eviction() {
        let mut recorder = DesyncRecorder::new(2);
        recorder.record(3, &[1]);
        recorder.record(3, &[2]);
        assert_eq!(recorder.hashes(3), Some(&[2][..]));
        assert_eq!(recorder.evictions(), 0);
    }

    #[test]
    fn test_replayed_frame_evicts_newer_record() {
        let mut recorder = DesyncRecorder::new(4);
        for frame in 4..8 {
            recorder.record(frame, &[frame]);
        }
        // Rollback to frame 2 shares a slot with frame 6.
        recorder.record(2, &[20]);
        assert_eq!(recorder.hashes(2), Some(&[20][..]));
        assert_eq!(recorder.hashes(6), None);
        assert_eq!(recorder.hashes(7), Some(&[7][..]));
        assert_eq!(recorder.evictions(), 1);
    }

    #[test]
    fn test_clear() {
        let mut recorder = DesyncRecorder::new(2);
        recorder.record(0, &[1]);
        recorder.clear();
        assert!(recorder.is_empty());
        assert_eq!(recorder.hashes(0), None);
    }

    #[test]
    fn test_first_divergence() {
        assert_eq!(first_divergence(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_divergence(&[1, 2, 3], &[1, 9, 3]), Some(1));
        assert_eq!(first_divergence(&[1, 2], &[1, 2, 3]), Some(2));
    }

    #[test]
    fn test_stage_label() {
        let names = ["countdown", "movement"];
        assert_eq!(stage_label(&names, 0), Some(BEGIN_FRAME_LABEL));
        assert_eq!(stage_label(&names, 2), Some("movement"));
        assert_eq!(stage_label(&names, 3), None);
    }
}
