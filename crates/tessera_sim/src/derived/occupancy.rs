//! # Occupancy Grid
//!
//! Eager cache: one bit per cell, set where an active building's footprint
//! covers the cell. Fully re-rasterized on every dirty rebuild.

use super::grid::{BitGrid, GridShape};
use super::DerivedCache;
use crate::world::{Cell, World};

/// Bit grid of cells blocked by buildings.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    shape: GridShape,
    bits: BitGrid,
    dirty: bool,
}

impl OccupancyGrid {
    /// Creates an empty, dirty grid.
    #[must_use]
    pub fn new(shape: GridShape) -> Self {
        Self {
            shape,
            bits: BitGrid::new(shape.cell_count()),
            dirty: true,
        }
    }

    /// Rasterizes `world` into a brand new grid.
    #[must_use]
    pub fn compute(world: &World, shape: GridShape) -> Self {
        let mut grid = Self::new(shape);
        grid.rasterize(world);
        grid.dirty = false;
        grid
    }

    fn rasterize(&mut self, world: &World) {
        self.bits.clear();
        for (_, row) in world.buildings.iter_active() {
            for index in self.shape.footprint_indices(row.footprint) {
                self.bits.set(index);
            }
        }
    }

    /// Returns the grid shape.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub fn bits(&self) -> &BitGrid {
        &self.bits
    }

    /// Checks if `cell` is blocked. Cells off the grid count as blocked.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.shape.index_of(cell).map_or(true, |index| self.bits.get(index))
    }

    /// Checks if `cell` is on the grid and unblocked.
    #[inline]
    #[must_use]
    pub fn is_free(&self, cell: Cell) -> bool {
        !self.is_occupied(cell)
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.bits.count_ones()
    }
}

impl DerivedCache for OccupancyGrid {
    type Deps<'a> = ();

    fn name(&self) -> &'static str {
        "occupancy"
    }

    fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn rebuild(&mut self, world: &World, _deps: ()) {
        if !self.dirty {
            return;
        }
        self.rasterize(world);
        self.dirty = false;
    }
}
