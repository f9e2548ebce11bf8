//! Grid addressing and the bit grid shared by the derived caches.

use crate::config::GridConfig;
use crate::world::{Cell, Footprint};

/// Dimensions of the simulation grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

impl GridShape {
    /// Creates a shape.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "Grid dimensions must be positive");
        Self { width, height }
    }

    /// Shape described by a grid config.
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(i32::from(config.width), i32::from(config.height))
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub const fn cell_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Checks if `cell` lies on the grid.
    #[inline]
    #[must_use]
    pub const fn contains(self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Row-major index of `cell`, or `None` off the grid.
    #[inline]
    #[must_use]
    pub const fn index_of(self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.y as usize) * (self.width as usize) + cell.x as usize)
        } else {
            None
        }
    }

    /// Intersection of `footprint` with the grid. Empty when they do not
    /// overlap.
    #[must_use]
    pub fn clip(self, footprint: Footprint) -> Footprint {
        let left = footprint.x.max(0);
        let top = footprint.y.max(0);
        let right = footprint.right().min(self.width);
        let bottom = footprint.bottom().min(self.height);
        Footprint::new(left, top, (right - left).max(0), (bottom - top).max(0))
    }

    /// Row-major indices of the on-grid cells `footprint` covers.
    pub fn footprint_indices(self, footprint: Footprint) -> impl Iterator<Item = usize> {
        self.clip(footprint).cells().filter_map(move |cell| self.index_of(cell))
    }

    /// Cell at a row-major index.
    #[inline]
    #[must_use]
    pub const fn cell_at(self, index: usize) -> Cell {
        Cell::new((index % self.width as usize) as i32, (index / self.width as usize) as i32)
    }
}

/// One bit per grid cell. 64 cells per word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitGrid {
    words: Vec<u64>,
    len: usize,
}

impl BitGrid {
    /// Creates a grid of `len` cleared bits.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Number of bits.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if the grid has no bits.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads a bit; out of range reads as clear.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Sets a bit, returning `true` if it was previously clear.
    #[inline]
    pub fn set(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        let mask = 1u64 << (index % 64);
        let word = &mut self.words[index / 64];
        let was_clear = *word & mask == 0;
        *word |= mask;
        was_clear
    }

    /// Clears every bit without touching the allocation.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
