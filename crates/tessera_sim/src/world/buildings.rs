//! # Building Table
//!
//! Static structures. Derived caches rasterize their footprints, so every
//! structural change bumps a revision counter the caches compare against.

use tessera_core::{Column, CoreResult, Handle, Slot, SlotIndex, StateHasher, Table, TableId};

use super::cell::Footprint;

/// Liveness bit of the `flags` column.
pub const BUILDING_ACTIVE: u8 = 1;

/// What a building does for derived state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BuildingKind {
    /// Blocks movement, consumes power.
    #[default]
    Structure = 0,
    /// Source of power coverage.
    Generator = 1,
    /// Carries power between buildings.
    Conduit = 2,
}

impl BuildingKind {
    /// Decodes the stored byte; unknown values read as `Structure`.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Generator,
            2 => Self::Conduit,
            _ => Self::Structure,
        }
    }

    /// Encodes the kind for storage.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Initial field values for a new building.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildingSpawn {
    /// Occupied cells.
    pub footprint: Footprint,
    /// Role of the building.
    pub kind: BuildingKind,
    /// Owning player.
    pub owner: u8,
}

/// Copy of one building's fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildingRow {
    /// Occupied cells.
    pub footprint: Footprint,
    /// Role of the building.
    pub kind: BuildingKind,
    /// Owning player.
    pub owner: u8,
    /// Flag bits, see [`BUILDING_ACTIVE`].
    pub flags: u8,
}

impl BuildingRow {
    /// Checks the liveness flag.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.flags & BUILDING_ACTIVE != 0
    }
}

/// Mutable access to one building's fields.
#[derive(Debug)]
pub struct BuildingRowMut<'a> {
    /// Occupied cells.
    pub footprint: &'a mut Footprint,
    /// Stored [`BuildingKind`] byte.
    pub kind: &'a mut u8,
    /// Owning player.
    pub owner: &'a mut u8,
    /// Flag bits, see [`BUILDING_ACTIVE`].
    pub flags: &'a mut u8,
}

impl BuildingRowMut<'_> {
    /// Sets or clears the liveness flag.
    #[inline]
    pub fn set_active(&mut self, active: bool) {
        if active {
            *self.flags |= BUILDING_ACTIVE;
        } else {
            *self.flags &= !BUILDING_ACTIVE;
        }
    }
}

/// Structure-of-arrays storage for buildings.
#[derive(Clone, Debug)]
pub struct BuildingTable {
    index: SlotIndex,
    footprints: Column<Footprint>,
    kinds: Column<u8>,
    owners: Column<u8>,
    flags: Column<u8>,
    /// Bumped on every structural change; not replicated state.
    revision: u64,
}

impl BuildingTable {
    /// Creates an empty table with fixed capacity.
    #[must_use]
    pub fn new(table: TableId, capacity: u32) -> Self {
        Self {
            index: SlotIndex::new(table, "buildings", capacity),
            footprints: Column::new(capacity),
            kinds: Column::new(capacity),
            owners: Column::new(capacity),
            flags: Column::new(capacity),
            revision: 0,
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.index.capacity()
    }

    /// Returns the structural revision.
    ///
    /// Any allocation, release, reset or mutable row access changes it.
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Allocates an active building.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CapacityExhausted`](tessera_core::CoreError)
    /// when every slot is live.
    pub fn place(&mut self, spawn: BuildingSpawn) -> CoreResult<Handle> {
        let handle = self.allocate()?;
        if let Some(row) = self.row_mut(handle) {
            *row.footprint = spawn.footprint;
            *row.kind = spawn.kind.as_raw();
            *row.owner = spawn.owner;
            *row.flags = BUILDING_ACTIVE;
        }
        Ok(handle)
    }

    /// Reads the row behind `handle`.
    #[must_use]
    pub fn row(&self, handle: Handle) -> Option<BuildingRow> {
        self.try_row(self.resolve(handle)?)
    }

    /// Reads the row at `slot` if the slot is live.
    #[must_use]
    pub fn try_row(&self, slot: Slot) -> Option<BuildingRow> {
        self.index.get_stable_id(slot)?;
        Some(BuildingRow {
            footprint: *self.footprints.get(slot)?,
            kind: BuildingKind::from_raw(*self.kinds.get(slot)?),
            owner: *self.owners.get(slot)?,
            flags: *self.flags.get(slot)?,
        })
    }

    /// Mutable access to the row behind `handle`.
    pub fn row_mut(&mut self, handle: Handle) -> Option<BuildingRowMut<'_>> {
        let slot = self.resolve(handle)?;
        self.try_row_mut(slot)
    }

    /// Mutable access to the row at `slot` if the slot is live.
    pub fn try_row_mut(&mut self, slot: Slot) -> Option<BuildingRowMut<'_>> {
        self.index.get_stable_id(slot)?;
        self.revision += 1;
        Some(BuildingRowMut {
            footprint: self.footprints.get_mut(slot)?,
            kind: self.kinds.get_mut(slot)?,
            owner: self.owners.get_mut(slot)?,
            flags: self.flags.get_mut(slot)?,
        })
    }

    /// Iterates live, active buildings in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (Slot, BuildingRow)> + '_ {
        self.index
            .iter_live()
            .filter_map(|(slot, _)| self.try_row(slot).map(|row| (slot, row)))
            .filter(|(_, row)| row.is_active())
    }
}

impl Table for BuildingTable {
    fn index(&self) -> &SlotIndex {
        &self.index
    }

    fn index_mut(&mut self) -> &mut SlotIndex {
        &mut self.index
    }

    fn clear_row(&mut self, slot: Slot) {
        self.footprints.reset(slot);
        self.kinds.reset(slot);
        self.owners.reset(slot);
        self.flags.reset(slot);
        self.revision += 1;
    }

    fn hash_row(&self, slot: Slot, hasher: &mut StateHasher) {
        self.footprints.hash_slot(slot, hasher);
        self.kinds.hash_slot(slot, hasher);
        self.owners.hash_slot(slot, hasher);
        self.flags.hash_slot(slot, hasher);
    }

    fn is_active(&self, slot: Slot) -> bool {
        self.flags.get(slot).is_some_and(|&flags| flags & BUILDING_ACTIVE != 0)
    }
}
