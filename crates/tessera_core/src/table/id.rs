//! # Row Identity
//!
//! Rows are addressed three ways:
//! - [`Slot`]: the dense array position, recycled through the free list
//! - [`StableId`]: issued once per allocation, never reissued by its table
//! - [`Handle`]: `{StableId, TableId}`, the only reference that may be held
//!   across frames

use std::fmt;

/// Per-table identifier issued at allocation time.
///
/// Identifiers increase monotonically and are never reused for the lifetime
/// of the table, so a stale identifier can never resolve to a recycled slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StableId(pub u64);

impl StableId {
    /// Sentinel stored in slots that hold no row.
    pub const NONE: Self = Self(u64::MAX);

    /// First identifier issued by a fresh or reset table.
    pub const FIRST: Self = Self(1);

    /// Returns the raw identifier value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Checks if this is the empty-slot sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u64::MAX
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense array position backing one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Slot(pub u32);

impl Slot {
    /// Returns the slot as an array index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies one table inside a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TableId(pub u16);

/// Durable cross-component reference to one row.
///
/// Holding a handle does not keep the row alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Identifier of the row within its table.
    pub id: StableId,
    /// Table the row belongs to.
    pub table: TableId,
}

impl Handle {
    /// Creates a handle.
    #[inline]
    #[must_use]
    pub const fn new(id: StableId, table: TableId) -> Self {
        Self { id, table }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.table.0)
    }
}

/// Result of resolving a handle against its table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liveness {
    /// The identifier no longer resolves to a slot.
    Missing,
    /// The row exists but its liveness flag is cleared.
    Inactive,
    /// The row exists and is active.
    Live,
}
