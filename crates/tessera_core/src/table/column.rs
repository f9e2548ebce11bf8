//! # Column Storage
//!
//! One field of one table, stored densely by slot. A table is a
//! [`SlotIndex`](super::SlotIndex) plus one `Column` per field.

use bytemuck::Pod;

use super::id::Slot;
use crate::hash::StateHasher;

/// Pre-allocated storage for a single row field.
///
/// This storage guarantees:
/// - Zero allocations after initialization
/// - O(1) access by slot
/// - Exact, byte-level hashing of each value
///
/// # Example
///
/// ```rust,ignore
/// let mut health: Column<i32> = Column::new(1024);
/// health.set(Slot(7), 100);
/// ```
#[derive(Clone, Debug)]
pub struct Column<C: Pod + Default> {
    /// The dense array of values.
    data: Box<[C]>,
}

impl<C: Pod + Default> Column<C> {
    /// Creates a column with every slot set to the default value.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            data: vec![C::default(); capacity as usize].into_boxed_slice(),
        }
    }

    /// Returns the capacity of this column.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Gets the value at `slot`, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&C> {
        self.data.get(slot.index())
    }

    /// Gets the value at `slot` mutably, or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut C> {
        self.data.get_mut(slot.index())
    }

    /// Overwrites the value at `slot`.
    ///
    /// # Returns
    ///
    /// `true` if the value was set, `false` if the slot was out of bounds.
    #[inline]
    pub fn set(&mut self, slot: Slot, value: C) -> bool {
        if let Some(cell) = self.data.get_mut(slot.index()) {
            *cell = value;
            true
        } else {
            false
        }
    }

    /// Restores the value at `slot` to its default.
    #[inline]
    pub fn reset(&mut self, slot: Slot) {
        if let Some(cell) = self.data.get_mut(slot.index()) {
            *cell = C::default();
        }
    }

    /// Restores every slot to its default.
    pub fn clear(&mut self) {
        for cell in self.data.iter_mut() {
            *cell = C::default();
        }
    }

    /// Returns all values, live or not.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Feeds the raw bytes of the value at `slot` into `hasher`.
    #[inline]
    pub fn hash_slot(&self, slot: Slot, hasher: &mut StateHasher) {
        if let Some(value) = self.data.get(slot.index()) {
            hasher.write_pod(value);
        }
    }
}
