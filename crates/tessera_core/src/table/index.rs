//! # Slot Index
//!
//! Allocation bookkeeping shared by every table: the free list, the
//! identifier counter and the two-way slot/identifier mapping.
//!
//! The reverse lookup (identifier to slot) is a hash map with its full
//! capacity reserved up front and a fixed-key hasher. It is never iterated,
//! so its internal order cannot leak into hashes or simulation results.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use super::id::{Slot, StableId, TableId};
use crate::error::{CoreError, CoreResult};
use crate::hash::StateHasher;

type IdMap = HashMap<StableId, Slot, BuildHasherDefault<DefaultHasher>>;

/// Free list plus two-way slot/identifier mapping for one table.
///
/// # Determinism
///
/// Freed slots are pushed onto a stack and reused last-in first-out, and
/// identifiers come from a monotonic counter. Two replicas issuing the same
/// allocate/free sequence reach the same layout.
#[derive(Clone, Debug)]
pub struct SlotIndex {
    /// Table this index belongs to.
    table: TableId,
    /// Table name used in errors and hash reports.
    name: &'static str,
    /// Fixed capacity.
    capacity: u32,
    /// Number of live rows.
    live: u32,
    /// Free slots; the top of the stack is reused next.
    free: Vec<Slot>,
    /// Next identifier to issue.
    next_id: u64,
    /// Slot to identifier, `StableId::NONE` when free.
    slot_ids: Box<[StableId]>,
    /// Identifier to slot for live rows only.
    id_slots: IdMap,
}

impl SlotIndex {
    /// Creates an index with every slot free.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(table: TableId, name: &'static str, capacity: u32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        let mut index = Self {
            table,
            name,
            capacity,
            live: 0,
            free: Vec::with_capacity(capacity as usize),
            next_id: StableId::FIRST.0,
            slot_ids: vec![StableId::NONE; capacity as usize].into_boxed_slice(),
            id_slots: IdMap::with_capacity_and_hasher(capacity as usize, BuildHasherDefault::default()),
        };
        index.fill_free_list();
        index
    }

    /// Pushes every slot so that slot 0 is popped first.
    fn fill_free_list(&mut self) {
        self.free.clear();
        self.free.extend((0..self.capacity).rev().map(Slot));
    }

    /// Returns the table identifier.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> TableId {
        self.table
    }

    /// Returns the table name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the number of live rows.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> u32 {
        self.live
    }

    /// Returns the identifier the next allocation will receive.
    #[inline]
    #[must_use]
    pub const fn next_stable_id(&self) -> StableId {
        StableId(self.next_id)
    }

    /// Takes a free slot and assigns it the next identifier.
    ///
    /// This is a **zero-allocation** operation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CapacityExhausted`] when no slot is free.
    pub fn allocate(&mut self) -> CoreResult<(Slot, StableId)> {
        let Some(slot) = self.free.pop() else {
            return Err(CoreError::CapacityExhausted {
                table: self.name,
                capacity: self.capacity,
            });
        };

        let id = StableId(self.next_id);
        self.next_id += 1;

        self.slot_ids[slot.index()] = id;
        self.id_slots.insert(id, slot);
        self.live += 1;

        Ok((slot, id))
    }

    /// Releases the row identified by `id`.
    ///
    /// Both mapping directions are cleared before the slot is returned to
    /// the free list. Releasing an unknown or already released identifier
    /// is a no-op.
    ///
    /// # Returns
    ///
    /// The slot that was released, or `None` if `id` did not resolve.
    pub fn free(&mut self, id: StableId) -> Option<Slot> {
        let slot = self.id_slots.remove(&id)?;
        self.slot_ids[slot.index()] = StableId::NONE;
        self.free.push(slot);
        self.live -= 1;
        Some(slot)
    }

    /// Resolves an identifier to its slot.
    #[inline]
    #[must_use]
    pub fn get_slot(&self, id: StableId) -> Option<Slot> {
        self.id_slots.get(&id).copied()
    }

    /// Resolves a slot to the identifier of the row it holds.
    #[inline]
    #[must_use]
    pub fn get_stable_id(&self, slot: Slot) -> Option<StableId> {
        match self.slot_ids.get(slot.index()) {
            Some(&id) if !id.is_none() => Some(id),
            _ => None,
        }
    }

    /// Iterates live rows in slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = (Slot, StableId)> + '_ {
        self.slot_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| !id.is_none())
            .map(|(slot, &id)| (Slot(slot as u32), id))
    }

    /// Restores the freshly constructed state: no live rows, the full free
    /// list in construction order and the identifier counter rewound.
    ///
    /// No memory is freed or allocated.
    pub fn reset(&mut self) {
        self.id_slots.clear();
        for id in self.slot_ids.iter_mut() {
            *id = StableId::NONE;
        }
        self.fill_free_list();
        self.next_id = StableId::FIRST.0;
        self.live = 0;
    }

    /// Checks that both mapping directions, the live count and the free
    /// list agree with each other.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InconsistentReset`] naming the broken invariant.
    pub fn verify(&self) -> CoreResult<()> {
        let fail = |detail: &'static str| -> CoreResult<()> {
            Err(CoreError::InconsistentReset {
                table: self.name,
                detail,
            })
        };

        let mut mapped = 0u32;
        for (slot, id) in self.iter_live() {
            if self.id_slots.get(&id) != Some(&slot) {
                return fail("slot to id mapping has no matching reverse entry");
            }
            if id.0 >= self.next_id {
                return fail("live id was never issued");
            }
            mapped += 1;
        }

        if mapped != self.live || self.id_slots.len() != self.live as usize {
            return fail("live count disagrees with mappings");
        }
        if self.free.len() + self.live as usize != self.capacity as usize {
            return fail("free list and live rows do not cover capacity");
        }
        Ok(())
    }

    /// Feeds the layout header into `hasher`.
    ///
    /// Free slots are skipped entirely; live slots are hashed by the owning
    /// table together with their row content.
    pub fn hash_layout(&self, hasher: &mut StateHasher) {
        hasher.write_u16(self.table.0);
        hasher.write_u32(self.live);
        hasher.write_u64(self.next_id);
    }
}
