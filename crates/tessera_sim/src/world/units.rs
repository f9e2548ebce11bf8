//! # Unit Table
//!
//! Mobile units. Fields are stored as parallel columns indexed by slot.

use tessera_core::{Column, CoreResult, Handle, Slot, SlotIndex, StateHasher, Table, TableId};

use super::cell::Cell;

/// Liveness bit of the `flags` column.
pub const UNIT_ACTIVE: u8 = 1;

/// Health a freshly spawned unit starts with.
pub const UNIT_MAX_HEALTH: i32 = 100;

/// Initial field values for a new unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSpawn {
    /// Starting cell.
    pub position: Cell,
    /// Cell the unit walks toward.
    pub target: Cell,
    /// Owning player.
    pub owner: u8,
}

/// Copy of one unit's fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitRow {
    /// Current cell.
    pub position: Cell,
    /// Destination cell.
    pub target: Cell,
    /// Current health.
    pub health: i32,
    /// Owning player.
    pub owner: u8,
    /// Flag bits, see [`UNIT_ACTIVE`].
    pub flags: u8,
    /// Frames spent inactive.
    pub idle_frames: u32,
}

impl UnitRow {
    /// Checks the liveness flag.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.flags & UNIT_ACTIVE != 0
    }
}

/// Mutable access to one unit's fields.
#[derive(Debug)]
pub struct UnitRowMut<'a> {
    /// Current cell.
    pub position: &'a mut Cell,
    /// Destination cell.
    pub target: &'a mut Cell,
    /// Current health.
    pub health: &'a mut i32,
    /// Owning player.
    pub owner: &'a mut u8,
    /// Flag bits, see [`UNIT_ACTIVE`].
    pub flags: &'a mut u8,
    /// Frames spent inactive.
    pub idle_frames: &'a mut u32,
}

impl UnitRowMut<'_> {
    /// Checks the liveness flag.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.flags & UNIT_ACTIVE != 0
    }

    /// Sets or clears the liveness flag.
    #[inline]
    pub fn set_active(&mut self, active: bool) {
        if active {
            *self.flags |= UNIT_ACTIVE;
        } else {
            *self.flags &= !UNIT_ACTIVE;
        }
    }
}

/// Structure-of-arrays storage for units.
#[derive(Clone, Debug)]
pub struct UnitTable {
    index: SlotIndex,
    positions: Column<Cell>,
    targets: Column<Cell>,
    health: Column<i32>,
    owners: Column<u8>,
    flags: Column<u8>,
    idle_frames: Column<u32>,
}

impl UnitTable {
    /// Creates an empty table with fixed capacity.
    #[must_use]
    pub fn new(table: TableId, capacity: u32) -> Self {
        Self {
            index: SlotIndex::new(table, "units", capacity),
            positions: Column::new(capacity),
            targets: Column::new(capacity),
            health: Column::new(capacity),
            owners: Column::new(capacity),
            flags: Column::new(capacity),
            idle_frames: Column::new(capacity),
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.index.capacity()
    }

    /// Allocates an active unit at full health.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CapacityExhausted`](tessera_core::CoreError)
    /// when every slot is live.
    pub fn spawn(&mut self, spawn: UnitSpawn) -> CoreResult<Handle> {
        let handle = self.allocate()?;
        if let Some(row) = self.row_mut(handle) {
            *row.position = spawn.position;
            *row.target = spawn.target;
            *row.health = UNIT_MAX_HEALTH;
            *row.owner = spawn.owner;
            *row.flags = UNIT_ACTIVE;
        }
        Ok(handle)
    }

    /// Reads the row behind `handle`.
    #[must_use]
    pub fn row(&self, handle: Handle) -> Option<UnitRow> {
        self.try_row(self.resolve(handle)?)
    }

    /// Reads the row at `slot` if the slot is live.
    #[must_use]
    pub fn try_row(&self, slot: Slot) -> Option<UnitRow> {
        self.index.get_stable_id(slot)?;
        Some(UnitRow {
            position: *self.positions.get(slot)?,
            target: *self.targets.get(slot)?,
            health: *self.health.get(slot)?,
            owner: *self.owners.get(slot)?,
            flags: *self.flags.get(slot)?,
            idle_frames: *self.idle_frames.get(slot)?,
        })
    }

    /// Mutable access to the row behind `handle`.
    pub fn row_mut(&mut self, handle: Handle) -> Option<UnitRowMut<'_>> {
        let slot = self.resolve(handle)?;
        self.try_row_mut(slot)
    }

    /// Mutable access to the row at `slot` if the slot is live.
    pub fn try_row_mut(&mut self, slot: Slot) -> Option<UnitRowMut<'_>> {
        self.index.get_stable_id(slot)?;
        Some(UnitRowMut {
            position: self.positions.get_mut(slot)?,
            target: self.targets.get_mut(slot)?,
            health: self.health.get_mut(slot)?,
            owner: self.owners.get_mut(slot)?,
            flags: self.flags.get_mut(slot)?,
            idle_frames: self.idle_frames.get_mut(slot)?,
        })
    }
}

impl Table for UnitTable {
    fn index(&self) -> &SlotIndex {
        &self.index
    }

    fn index_mut(&mut self) -> &mut SlotIndex {
        &mut self.index
    }

    fn clear_row(&mut self, slot: Slot) {
        self.positions.reset(slot);
        self.targets.reset(slot);
        self.health.reset(slot);
        self.owners.reset(slot);
        self.flags.reset(slot);
        self.idle_frames.reset(slot);
    }

    fn hash_row(&self, slot: Slot, hasher: &mut StateHasher) {
        self.positions.hash_slot(slot, hasher);
        self.targets.hash_slot(slot, hasher);
        self.health.hash_slot(slot, hasher);
        self.owners.hash_slot(slot, hasher);
        self.flags.hash_slot(slot, hasher);
        self.idle_frames.hash_slot(slot, hasher);
    }

    fn is_active(&self, slot: Slot) -> bool {
        self.flags.get(slot).is_some_and(|&flags| flags & UNIT_ACTIVE != 0)
    }
}
