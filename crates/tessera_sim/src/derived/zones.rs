//! # Zone Graph
//!
//! Lazy reachability over a sectorized grid. The grid is cut into square
//! sectors; free cells inside a sector are labelled by connected component
//! the first time a query touches that sector. Reachability then runs a BFS
//! over (sector, label) zones, crossing sector borders wherever two free
//! cells are orthogonally adjacent.
//!
//! Invalidation only forgets which sectors are labelled, so it costs one
//! bit clear per sector. Answers are a pure function of the occupancy grid
//! regardless of which sectors happened to be labelled earlier.

use super::grid::{BitGrid, GridShape};
use super::occupancy::OccupancyGrid;
use super::DerivedCache;
use crate::world::{Cell, World};

/// Connected component of free cells inside one sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ZoneId {
    /// Sector index, row-major.
    pub sector: u32,
    /// Component label inside the sector, starting at 1.
    pub label: u16,
}

/// Lazily labelled sector graph.
#[derive(Clone, Debug)]
pub struct ZoneGraph {
    shape: GridShape,
    sector_size: i32,
    sectors_x: i32,
    sectors_y: i32,
    /// Per cell component label; 0 for blocked or unlabelled cells.
    labels: Vec<u16>,
    /// Per sector: labels are current.
    labelled: BitGrid,
    /// Upper bound on labels per sector, plus one.
    stride: usize,
    cell_queue: Vec<u32>,
    zone_queue: Vec<ZoneId>,
    visited: BitGrid,
}

impl ZoneGraph {
    /// Creates a graph with no labelled sectors.
    ///
    /// # Panics
    ///
    /// Panics if `sector_size` is not positive.
    #[must_use]
    pub fn new(shape: GridShape, sector_size: u32) -> Self {
        assert!(sector_size > 0, "Sector size must be greater than zero");
        let size = sector_size.min(shape.width.max(shape.height) as u32).max(1) as i32;
        let sectors_x = (shape.width + size - 1) / size;
        let sectors_y = (shape.height + size - 1) / size;
        let sector_count = (sectors_x * sectors_y) as usize;
        let area = (size * size) as usize;
        let stride = area.div_ceil(2) + 1;

        Self {
            shape,
            sector_size: size,
            sectors_x,
            sectors_y,
            labels: vec![0; shape.cell_count()],
            labelled: BitGrid::new(sector_count),
            stride,
            cell_queue: Vec::with_capacity(area),
            zone_queue: Vec::with_capacity(sector_count * stride),
            visited: BitGrid::new(sector_count * stride),
        }
    }

    /// Number of sectors.
    #[inline]
    #[must_use]
    pub fn sector_count(&self) -> usize {
        self.labelled.len()
    }

    /// Number of sectors whose labels are currently valid.
    #[must_use]
    pub fn labelled_sectors(&self) -> usize {
        self.labelled.count_ones()
    }

    fn sector_of(&self, cell: Cell) -> u32 {
        let sx = cell.x / self.sector_size;
        let sy = cell.y / self.sector_size;
        (sy * self.sectors_x + sx) as u32
    }

    /// Cell bounds `[x0, x1) x [y0, y1)` of `sector`, clipped to the grid.
    fn sector_bounds(&self, sector: u32) -> (i32, i32, i32, i32) {
        let sx = sector as i32 % self.sectors_x;
        let sy = sector as i32 / self.sectors_x;
        let x0 = sx * self.sector_size;
        let y0 = sy * self.sector_size;
        let x1 = (x0 + self.sector_size).min(self.shape.width);
        let y1 = (y0 + self.sector_size).min(self.shape.height);
        (x0, y0, x1, y1)
    }

    fn ensure_sector(&mut self, sector: u32, occupancy: &OccupancyGrid) {
        if self.labelled.get(sector as usize) {
            return;
        }
        let shape = self.shape;
        let (x0, y0, x1, y1) = self.sector_bounds(sector);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(index) = shape.index_of(Cell::new(x, y)) {
                    self.labels[index] = 0;
                }
            }
        }

        let mut next_label: u16 = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                let seed = Cell::new(x, y);
                let Some(seed_index) = shape.index_of(seed) else {
                    continue;
                };
                if self.labels[seed_index] != 0 || occupancy.is_occupied(seed) {
                    continue;
                }
                next_label += 1;
                self.labels[seed_index] = next_label;
                self.cell_queue.clear();
                self.cell_queue.push(seed_index as u32);

                let mut head = 0;
                while head < self.cell_queue.len() {
                    let cell = shape.cell_at(self.cell_queue[head] as usize);
                    head += 1;
                    for next in cell.neighbors() {
                        if next.x < x0 || next.x >= x1 || next.y < y0 || next.y >= y1 {
                            continue;
                        }
                        let Some(index) = shape.index_of(next) else {
                            continue;
                        };
                        if self.labels[index] == 0 && !occupancy.is_occupied(next) {
                            self.labels[index] = next_label;
                            self.cell_queue.push(index as u32);
                        }
                    }
                }
            }
        }
        self.labelled.set(sector as usize);
    }

    /// Returns the zone containing `cell`, labelling its sector on demand.
    ///
    /// Returns `None` for blocked or off-grid cells.
    pub fn zone_of(&mut self, cell: Cell, occupancy: &OccupancyGrid) -> Option<ZoneId> {
        let index = self.shape.index_of(cell)?;
        if occupancy.is_occupied(cell) {
            return None;
        }
        let sector = self.sector_of(cell);
        self.ensure_sector(sector, occupancy);
        Some(ZoneId {
            sector,
            label: self.labels[index],
        })
    }

    /// Checks whether a free path connects `from` and `to`.
    ///
    /// Blocked or off-grid endpoints are never reachable.
    pub fn reachable(&mut self, from: Cell, to: Cell, occupancy: &OccupancyGrid) -> bool {
        let (Some(start), Some(goal)) = (self.zone_of(from, occupancy), self.zone_of(to, occupancy))
        else {
            return false;
        };
        if start == goal {
            return true;
        }

        self.visited.clear();
        self.zone_queue.clear();
        self.visited.set(self.zone_slot(start));
        self.zone_queue.push(start);

        let mut head = 0;
        while head < self.zone_queue.len() {
            let zone = self.zone_queue[head];
            head += 1;
            if zone == goal {
                return true;
            }
            self.expand(zone, occupancy);
        }
        false
    }

    fn zone_slot(&self, zone: ZoneId) -> usize {
        zone.sector as usize * self.stride + zone.label as usize
    }

    /// Pushes every unvisited zone bordering `zone`.
    fn expand(&mut self, zone: ZoneId, occupancy: &OccupancyGrid) {
        let (x0, y0, x1, y1) = self.sector_bounds(zone.sector);
        // (border cell, step across the border) per side: N, E, S, W.
        for x in x0..x1 {
            self.cross(zone, Cell::new(x, y0), Cell::new(x, y0 - 1), occupancy);
        }
        for y in y0..y1 {
            self.cross(zone, Cell::new(x1 - 1, y), Cell::new(x1, y), occupancy);
        }
        for x in x0..x1 {
            self.cross(zone, Cell::new(x, y1 - 1), Cell::new(x, y1), occupancy);
        }
        for y in y0..y1 {
            self.cross(zone, Cell::new(x0, y), Cell::new(x0 - 1, y), occupancy);
        }
    }

    fn cross(&mut self, zone: ZoneId, inside: Cell, outside: Cell, occupancy: &OccupancyGrid) {
        let Some(index) = self.shape.index_of(inside) else {
            return;
        };
        if self.labels[index] != zone.label {
            return;
        }
        if let Some(neighbor) = self.zone_of(outside, occupancy) {
            let slot = self.zone_slot(neighbor);
            if self.visited.set(slot) {
                self.zone_queue.push(neighbor);
            }
        }
    }
}

impl DerivedCache for ZoneGraph {
    type Deps<'a> = &'a OccupancyGrid;

    fn name(&self) -> &'static str {
        "zones"
    }

    fn invalidate(&mut self) {
        self.labelled.clear();
    }

    /// Lazy: never rebuilt by the pipeline.
    fn is_dirty(&self) -> bool {
        false
    }

    fn rebuild(&mut self, _world: &World, _occupancy: &OccupancyGrid) {}
}
