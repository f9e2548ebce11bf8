//! # Power Coverage
//!
//! Eager cache: flood fill from generator footprints across contiguous
//! occupied cells. Buildings touching the filled region are powered, and
//! the region plus a one-cell margin forms the coverage field units react
//! to.

use super::grid::{BitGrid, GridShape};
use super::occupancy::OccupancyGrid;
use super::DerivedCache;
use crate::world::{BuildingKind, Cell, World};
use tessera_core::Slot;

/// Flood-filled power network.
#[derive(Clone, Debug)]
pub struct PowerCoverage {
    shape: GridShape,
    /// Occupied cells reached from a generator.
    network: BitGrid,
    /// Network plus its orthogonal margin.
    field: BitGrid,
    /// Building slots touching the network.
    powered: BitGrid,
    /// BFS frontier; capacity reserved for every cell.
    queue: Vec<u32>,
    dirty: bool,
}

impl PowerCoverage {
    /// Creates an empty, dirty cache for `building_capacity` building slots.
    #[must_use]
    pub fn new(shape: GridShape, building_capacity: u32) -> Self {
        Self {
            shape,
            network: BitGrid::new(shape.cell_count()),
            field: BitGrid::new(shape.cell_count()),
            powered: BitGrid::new(building_capacity as usize),
            queue: Vec::with_capacity(shape.cell_count()),
            dirty: true,
        }
    }

    /// Checks if `cell` lies inside the coverage field.
    #[inline]
    #[must_use]
    pub fn is_cell_powered(&self, cell: Cell) -> bool {
        self.shape.index_of(cell).is_some_and(|index| self.field.get(index))
    }

    /// Checks if the building at `slot` is connected to a generator.
    #[inline]
    #[must_use]
    pub fn is_building_powered(&self, slot: Slot) -> bool {
        self.powered.get(slot.index())
    }

    /// Number of powered buildings.
    #[must_use]
    pub fn powered_count(&self) -> usize {
        self.powered.count_ones()
    }

    fn flood(&mut self, world: &World, occupancy: &OccupancyGrid) {
        self.network.clear();
        self.field.clear();
        self.powered.clear();
        self.queue.clear();

        let shape = self.shape;
        for (_, row) in world.buildings.iter_active() {
            if row.kind != BuildingKind::Generator {
                continue;
            }
            for index in shape.footprint_indices(row.footprint) {
                if self.network.set(index) {
                    self.queue.push(index as u32);
                }
            }
        }

        let mut head = 0;
        while head < self.queue.len() {
            let cell = shape.cell_at(self.queue[head] as usize);
            head += 1;
            for next in cell.neighbors() {
                if !occupancy.is_occupied(next) {
                    continue;
                }
                if let Some(index) = shape.index_of(next) {
                    if self.network.set(index) {
                        self.queue.push(index as u32);
                    }
                }
            }
        }

        // The queue now holds exactly the network cells.
        for &index in &self.queue {
            let index = index as usize;
            self.field.set(index);
            for next in shape.cell_at(index).neighbors() {
                if let Some(n) = shape.index_of(next) {
                    self.field.set(n);
                }
            }
        }

        for (slot, row) in world.buildings.iter_active() {
            let touches = shape
                .footprint_indices(row.footprint)
                .any(|index| self.network.get(index));
            if touches {
                self.powered.set(slot.index());
            }
        }
    }
}

impl DerivedCache for PowerCoverage {
    type Deps<'a> = &'a OccupancyGrid;

    fn name(&self) -> &'static str {
        "power"
    }

    fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn rebuild(&mut self, world: &World, occupancy: &OccupancyGrid) {
        if !self.dirty {
            return;
        }
        self.flood(world, occupancy);
        self.dirty = false;
    }
}
