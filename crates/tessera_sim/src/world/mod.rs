//! # World Registry
//!
//! Owns every authoritative table and exposes whole-world reset and
//! deterministic hashing (full and per table).
//!
//! ## Hash Contract
//!
//! The state hash is a pure function of, for every table in registry order:
//! the layout header (live count, next identifier), and for every live slot
//! its slot number, its identifier and its field bytes. Free slots are
//! skipped. Transient per-frame counters are never hashed.

mod buildings;
mod cell;
mod match_state;
mod units;

pub use buildings::{
    BuildingKind, BuildingRow, BuildingRowMut, BuildingSpawn, BuildingTable, BUILDING_ACTIVE,
};
pub use cell::{Cell, Footprint};
pub use match_state::{MatchPhase, MatchState, NO_WINNER};
pub use units::{UnitRow, UnitRowMut, UnitSpawn, UnitTable, UNIT_ACTIVE, UNIT_MAX_HEALTH};

use tessera_core::{CoreResult, Handle, Liveness, SingletonTable, Slot, StateHasher, Table, TableId};

use crate::config::SimConfig;

/// Table identifier of [`World::units`].
pub const UNITS: TableId = TableId(1);
/// Table identifier of [`World::buildings`].
pub const BUILDINGS: TableId = TableId(2);
/// Table identifier of [`World::match_state`].
pub const MATCH_STATE: TableId = TableId(3);

/// Number of tables in the registry.
pub const TABLE_COUNT: usize = 3;

/// Transient per-frame counters, cleared by [`World::begin_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounters {
    /// Rows allocated this frame.
    pub spawned: u32,
    /// Rows whose liveness flag was cleared this frame.
    pub deactivated: u32,
    /// Rows released this frame.
    pub released: u32,
    /// Damage applications this frame.
    pub damage_events: u32,
}

/// Per-table hashes in registry order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableHashes {
    entries: [(&'static str, u64); TABLE_COUNT],
}

impl TableHashes {
    /// Looks up the hash of a table by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|(n, _)| *n == name).map(|&(_, hash)| hash)
    }

    /// Iterates `(table name, hash)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.entries.iter().copied()
    }

    /// Names of tables whose hash differs from `other`.
    pub fn diff<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = &'static str> + 'a {
        self.entries
            .iter()
            .zip(other.entries.iter())
            .filter(|(a, b)| a.1 != b.1)
            .map(|(a, _)| a.0)
    }
}

/// The set of all authoritative tables.
#[derive(Clone, Debug)]
pub struct World {
    /// Mobile units.
    pub units: UnitTable,
    /// Static buildings.
    pub buildings: BuildingTable,
    /// Global match state.
    pub match_state: SingletonTable<MatchState>,
    counters: FrameCounters,
}

impl World {
    /// Creates a world with capacities and initial match state from `config`.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            units: UnitTable::new(UNITS, config.tables.units),
            buildings: BuildingTable::new(BUILDINGS, config.tables.buildings),
            match_state: SingletonTable::new(
                MATCH_STATE,
                "match_state",
                MatchState::starting(config.rules.countdown_frames),
            ),
            counters: FrameCounters::default(),
        }
    }

    /// Clears transient per-frame counters. Row data is untouched.
    pub fn begin_frame(&mut self) {
        self.counters = FrameCounters::default();
    }

    /// Returns this frame's counters.
    #[inline]
    #[must_use]
    pub fn counters(&self) -> &FrameCounters {
        &self.counters
    }

    /// Returns this frame's counters mutably.
    #[inline]
    pub fn counters_mut(&mut self) -> &mut FrameCounters {
        &mut self.counters
    }

    /// Wipes every table back to its freshly constructed state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InconsistentReset`](tessera_core::CoreError) if
    /// any table fails its consistency check. The world must not be
    /// simulated further in that case.
    pub fn reset_all_tables(&mut self) -> CoreResult<()> {
        self.units.reset()?;
        self.buildings.reset()?;
        self.match_state.reset()?;
        self.counters = FrameCounters::default();
        Ok(())
    }

    /// Every table in registry order.
    #[must_use]
    pub fn tables(&self) -> [&dyn Table; TABLE_COUNT] {
        [&self.units, &self.buildings, &self.match_state]
    }

    /// Looks up a table by identifier.
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&dyn Table> {
        match id {
            UNITS => Some(&self.units),
            BUILDINGS => Some(&self.buildings),
            MATCH_STATE => Some(&self.match_state),
            _ => None,
        }
    }

    /// Looks up a table mutably by identifier.
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut dyn Table> {
        match id {
            UNITS => Some(&mut self.units),
            BUILDINGS => Some(&mut self.buildings),
            MATCH_STATE => Some(&mut self.match_state),
            _ => None,
        }
    }

    /// Resolves a handle to its slot in its own table.
    #[must_use]
    pub fn get_slot(&self, handle: Handle) -> Option<Slot> {
        self.table(handle.table)?.get_slot(handle.id)
    }

    /// Classifies a handle; unknown tables resolve to `Missing`.
    #[must_use]
    pub fn liveness(&self, handle: Handle) -> Liveness {
        self.table(handle.table)
            .map_or(Liveness::Missing, |table| table.liveness(handle))
    }

    /// Releases the row behind `handle`. Releasing twice is a no-op.
    pub fn release(&mut self, handle: Handle) -> bool {
        let released = self
            .table_mut(handle.table)
            .is_some_and(|table| table.free(handle.id));
        if released {
            self.counters.released += 1;
        }
        released
    }

    /// Returns the match singleton row.
    #[inline]
    #[must_use]
    pub fn match_state(&self) -> &MatchState {
        self.match_state.get()
    }

    /// Hash of every live row and its slot/identifier assignment.
    #[must_use]
    pub fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHasher::new();
        for table in self.tables() {
            hasher.write_u16(table.table_id().0);
            hasher.write_u64(table.state_hash());
        }
        hasher.finish()
    }

    /// Hash of each table, keyed by table name.
    #[must_use]
    pub fn compute_per_table_hashes(&self) -> TableHashes {
        let tables = self.tables();
        TableHashes {
            entries: std::array::from_fn(|i| (tables[i].name(), tables[i].state_hash())),
        }
    }
}
