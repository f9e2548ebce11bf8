//! # Singleton Tables
//!
//! A table of capacity one holding global match state. Its single row is
//! allocated on construction and reallocated with the initial value on
//! every reset, so it always has [`StableId::FIRST`].

use bytemuck::Pod;

use super::column::Column;
use super::id::{Slot, StableId, TableId};
use super::index::SlotIndex;
use super::Table;
use crate::error::CoreResult;
use crate::hash::StateHasher;

const ROW: Slot = Slot(0);

/// Capacity-one table whose row always exists.
#[derive(Clone, Debug)]
pub struct SingletonTable<R: Pod + Default> {
    index: SlotIndex,
    row: Column<R>,
    /// Value the row is reinitialized to on reset.
    initial: R,
}

impl<R: Pod + Default> SingletonTable<R> {
    /// Creates the table with its row set to `initial`.
    ///
    /// # Panics
    ///
    /// Never in practice: a freshly built capacity-one index has its only
    /// slot free.
    #[must_use]
    pub fn new(table: TableId, name: &'static str, initial: R) -> Self {
        let mut singleton = Self {
            index: SlotIndex::new(table, name, 1),
            row: Column::new(1),
            initial,
        };
        singleton
            .install_row()
            .expect("fresh capacity-one singleton index has its slot free");
        singleton
    }

    fn install_row(&mut self) -> CoreResult<()> {
        let (slot, _) = self.index.allocate()?;
        self.row.set(slot, self.initial);
        Ok(())
    }

    /// Returns the row.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &R {
        &self.row.as_slice()[ROW.index()]
    }

    /// Returns the row mutably.
    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        self.row.get_mut(ROW).unwrap_or_else(|| unreachable!("singleton row always exists"))
    }

    /// Returns the value the row is restored to on reset.
    #[inline]
    #[must_use]
    pub fn initial(&self) -> &R {
        &self.initial
    }
}

impl<R: Pod + Default> Table for SingletonTable<R> {
    fn index(&self) -> &SlotIndex {
        &self.index
    }

    fn index_mut(&mut self) -> &mut SlotIndex {
        &mut self.index
    }

    fn clear_row(&mut self, slot: Slot) {
        self.row.reset(slot);
    }

    fn hash_row(&self, slot: Slot, hasher: &mut StateHasher) {
        self.row.hash_slot(slot, hasher);
    }

    fn after_reset(&mut self) -> CoreResult<()> {
        self.install_row()
    }

    /// The singleton row cannot be released.
    fn free(&mut self, _id: StableId) -> bool {
        false
    }
}
