//! # Stable-ID Tables
//!
//! Dense, column-oriented storage for one row kind.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated at table creation
//! - Fields are stored in parallel [`Column`]s indexed by [`Slot`]
//! - Rows are referenced externally only through [`Handle`]s; a released
//!   [`StableId`] never resolves again, even after its slot is reused

mod column;
mod id;
mod index;
mod singleton;

pub use column::Column;
pub use id::{Handle, Liveness, Slot, StableId, TableId};
pub use index::SlotIndex;
pub use singleton::SingletonTable;

use crate::error::CoreResult;
use crate::hash::StateHasher;

/// Behaviour shared by every table.
///
/// Implementors supply the columns (`clear_row`, `hash_row`, `is_active`);
/// allocation, release, lookup, reset and hashing come from the shared
/// [`SlotIndex`].
pub trait Table {
    /// Returns the allocation bookkeeping.
    fn index(&self) -> &SlotIndex;

    /// Returns the allocation bookkeeping mutably.
    fn index_mut(&mut self) -> &mut SlotIndex;

    /// Restores every column of `slot` to its default value.
    fn clear_row(&mut self, slot: Slot);

    /// Feeds the logical content of the row at `slot` into `hasher`.
    fn hash_row(&self, slot: Slot, hasher: &mut StateHasher);

    /// Reads the liveness flag of the row at `slot`.
    ///
    /// Tables without a flag report every allocated row as active.
    fn is_active(&self, _slot: Slot) -> bool {
        true
    }

    /// Runs after the index and columns have been reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot restore its initial rows.
    fn after_reset(&mut self) -> CoreResult<()> {
        Ok(())
    }

    /// Returns the table identifier.
    fn table_id(&self) -> TableId {
        self.index().table()
    }

    /// Returns the table name.
    fn name(&self) -> &'static str {
        self.index().name()
    }

    /// Allocates a row with default field values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CapacityExhausted`](crate::CoreError) when the
    /// table is full. Callers must treat this as fatal.
    fn allocate(&mut self) -> CoreResult<Handle> {
        let (slot, id) = self.index_mut().allocate()?;
        self.clear_row(slot);
        Ok(Handle::new(id, self.table_id()))
    }

    /// Releases the row identified by `id`.
    ///
    /// # Returns
    ///
    /// `true` if a row was released, `false` if `id` did not resolve.
    fn free(&mut self, id: StableId) -> bool {
        match self.index_mut().free(id) {
            Some(slot) => {
                self.clear_row(slot);
                true
            }
            None => false,
        }
    }

    /// Resolves an identifier to its slot.
    fn get_slot(&self, id: StableId) -> Option<Slot> {
        self.index().get_slot(id)
    }

    /// Resolves a slot to the identifier of the row it holds.
    fn get_stable_id(&self, slot: Slot) -> Option<StableId> {
        self.index().get_stable_id(slot)
    }

    /// Resolves a handle to a slot, rejecting handles of other tables.
    fn resolve(&self, handle: Handle) -> Option<Slot> {
        if handle.table == self.table_id() {
            self.get_slot(handle.id)
        } else {
            None
        }
    }

    /// Classifies a handle as missing, inactive or live.
    fn liveness(&self, handle: Handle) -> Liveness {
        match self.resolve(handle) {
            None => Liveness::Missing,
            Some(slot) if self.is_active(slot) => Liveness::Live,
            Some(_) => Liveness::Inactive,
        }
    }

    /// Returns the number of live rows.
    fn live_count(&self) -> u32 {
        self.index().live_count()
    }

    /// Restores count, free list and identifier counter to their initial
    /// values and clears every column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InconsistentReset`](crate::CoreError) if the
    /// table fails its consistency check afterwards.
    fn reset(&mut self) -> CoreResult<()> {
        let capacity = self.index().capacity();
        for raw in 0..capacity {
            self.clear_row(Slot(raw));
        }
        self.index_mut().reset();
        self.after_reset()?;
        self.index().verify()
    }

    /// Feeds layout and every live row into `hasher`, in slot order.
    fn hash_into(&self, hasher: &mut StateHasher) {
        let index = self.index();
        index.hash_layout(hasher);
        for (slot, id) in index.iter_live() {
            hasher.write_u32(slot.0);
            hasher.write_u64(id.0);
            self.hash_row(slot, hasher);
        }
    }

    /// Returns the hash of this table alone.
    fn state_hash(&self) -> u64 {
        let mut hasher = StateHasher::new();
        self.hash_into(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal two-column table used to exercise the provided methods.
    struct Counters {
        index: SlotIndex,
        value: Column<u32>,
        active: Column<u8>,
    }

    impl Counters {
        fn new(capacity: u32) -> Self {
            Self {
                index: SlotIndex::new(TableId(9), "counters", capacity),
                value: Column::new(capacity),
                active: Column::new(capacity),
            }
        }
    }

    impl Table for Counters {
        fn index(&self) -> &SlotIndex {
            &self.index
        }

        fn index_mut(&mut self) -> &mut SlotIndex {
            &mut self.index
        }

        fn clear_row(&mut self, slot: Slot) {
            self.value.reset(slot);
            self.active.reset(slot);
        }

        fn hash_row(&self, slot: Slot, hasher: &mut StateHasher) {
            self.value.hash_slot(slot, hasher);
            self.active.hash_slot(slot, hasher);
        }

        fn is_active(&self, slot: Slot) -> bool {
            self.active.get(slot).is_some_and(|&flag| flag != 0)
        }
    }

    #[test]
    fn test_handle_resolution() {
        let mut table = Counters::new(4);
        let handle = table.allocate().unwrap();
        assert_eq!(handle.table, TableId(9));
        assert!(table.resolve(handle).is_some());

        let foreign = Handle::new(handle.id, TableId(1));
        assert!(table.resolve(foreign).is_none());
    }

    #[test]
    fn test_liveness_channels() {
        let mut table = Counters::new(4);
        let handle = table.allocate().unwrap();
        let slot = table.resolve(handle).unwrap();

        assert_eq!(table.liveness(handle), Liveness::Inactive);
        table.active.set(slot, 1);
        assert_eq!(table.liveness(handle), Liveness::Live);
        table.free(handle.id);
        assert_eq!(table.liveness(handle), Liveness::Missing);
    }

    #[test]
    fn test_free_clears_row() {
        let mut table = Counters::new(1);
        let handle = table.allocate().unwrap();
        let slot = table.resolve(handle).unwrap();
        table.value.set(slot, 55);

        assert!(table.free(handle.id));
        assert!(!table.free(handle.id));
        assert_eq!(table.value.get(slot), Some(&0));
    }

    #[test]
    fn test_hash_tracks_content_and_layout() {
        let mut a = Counters::new(4);
        let mut b = Counters::new(4);
        assert_eq!(a.state_hash(), b.state_hash());

        let ha = a.allocate().unwrap();
        let hb = b.allocate().unwrap();
        assert_eq!(a.state_hash(), b.state_hash());

        let slot = a.resolve(ha).unwrap();
        a.value.set(slot, 1);
        assert_ne!(a.state_hash(), b.state_hash());

        let slot = b.resolve(hb).unwrap();
        b.value.set(slot, 1);
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_reset_matches_fresh_table() {
        let mut used = Counters::new(4);
        for _ in 0..3 {
            used.allocate().unwrap();
        }
        used.reset().unwrap();

        let fresh = Counters::new(4);
        assert_eq!(used.state_hash(), fresh.state_hash());
        assert_eq!(used.live_count(), 0);
    }
}
