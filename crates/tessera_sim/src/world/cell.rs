//! Grid coordinates shared by tables and derived caches.

use bytemuck::{Pod, Zeroable};

/// One grid cell in integer coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Creates a cell.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four orthogonal neighbours in fixed order: north, east, south, west.
    #[inline]
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y + 1),
            Self::new(self.x - 1, self.y),
        ]
    }

    /// Manhattan distance to another cell.
    #[inline]
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Axis-aligned rectangle of cells occupied by a building.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Footprint {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

impl Footprint {
    /// Creates a footprint.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge, saturated at `i32::MAX`.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x.saturating_add(if self.width > 0 { self.width } else { 0 })
    }

    /// Exclusive bottom edge, saturated at `i32::MAX`.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(if self.height > 0 { self.height } else { 0 })
    }

    /// Checks if the footprint covers `cell`.
    #[inline]
    #[must_use]
    pub const fn contains(self, cell: Cell) -> bool {
        cell.x >= self.x && cell.y >= self.y && cell.x < self.right() && cell.y < self.bottom()
    }

    /// Iterates covered cells row by row.
    ///
    /// Walks the whole rectangle; callers working on a bounded grid clip
    /// first with [`GridShape::clip`](crate::derived::GridShape::clip).
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.right(), self.bottom());
        (top..bottom).flat_map(move |y| (left..right).map(move |x| Cell::new(x, y)))
    }
}
