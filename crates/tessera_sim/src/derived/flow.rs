//! # Flow Field Cache
//!
//! Lazy cache of breadth-first distance fields, one per destination cell,
//! held in a fixed number of pre-allocated slots. A miss on a full cache
//! evicts the least recently used slot (lowest slot index on ties), so the
//! set of cached fields is itself a deterministic function of the query
//! sequence.

use super::grid::GridShape;
use super::occupancy::OccupancyGrid;
use super::DerivedCache;
use crate::world::{Cell, World};

/// Distance value for cells with no path to the destination.
pub const UNREACHABLE: u16 = u16::MAX;

/// Step distances from every cell to one destination.
#[derive(Clone, Debug)]
pub struct FlowField {
    shape: GridShape,
    destination: Cell,
    distances: Vec<u16>,
}

impl FlowField {
    fn new(shape: GridShape) -> Self {
        Self {
            shape,
            destination: Cell::default(),
            distances: vec![UNREACHABLE; shape.cell_count()],
        }
    }

    /// Returns the destination cell.
    #[inline]
    #[must_use]
    pub const fn destination(&self) -> Cell {
        self.destination
    }

    /// Returns the step distance from `cell`, or `None` if unreachable.
    #[inline]
    #[must_use]
    pub fn distance(&self, cell: Cell) -> Option<u16> {
        self.shape
            .index_of(cell)
            .map(|index| self.distances[index])
            .filter(|&distance| distance != UNREACHABLE)
    }

    /// Returns the neighbour of `from` one step closer to the destination.
    ///
    /// Neighbours are tried in N, E, S, W order and the first strictly
    /// closest one wins. Returns `None` at the destination or when no
    /// neighbour has a path.
    #[must_use]
    pub fn next_step(&self, from: Cell) -> Option<Cell> {
        if from == self.destination {
            return None;
        }
        let current = self.distance(from).unwrap_or(UNREACHABLE);
        let mut best: Option<(u16, Cell)> = None;
        for next in from.neighbors() {
            let Some(distance) = self.distance(next) else {
                continue;
            };
            if distance >= current {
                continue;
            }
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, next));
            }
        }
        best.map(|(_, cell)| cell)
    }

    fn compute(&mut self, destination: Cell, occupancy: &OccupancyGrid, queue: &mut Vec<u32>) {
        self.destination = destination;
        self.distances.fill(UNREACHABLE);
        queue.clear();

        let Some(start) = self.shape.index_of(destination) else {
            return;
        };
        if occupancy.is_occupied(destination) {
            return;
        }
        self.distances[start] = 0;
        queue.push(start as u32);

        let mut head = 0;
        while head < queue.len() {
            let index = queue[head] as usize;
            head += 1;
            let distance = self.distances[index].saturating_add(1).min(UNREACHABLE - 1);
            for next in self.shape.cell_at(index).neighbors() {
                if occupancy.is_occupied(next) {
                    continue;
                }
                let Some(n) = self.shape.index_of(next) else {
                    continue;
                };
                if self.distances[n] == UNREACHABLE {
                    self.distances[n] = distance;
                    queue.push(n as u32);
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
struct FlowSlot {
    field: FlowField,
    valid: bool,
    last_used: u64,
}

/// Cache counters since the last invalidation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlowStats {
    /// Queries served from a cached field.
    pub hits: u64,
    /// Queries that computed a field.
    pub misses: u64,
    /// Misses that overwrote a valid field.
    pub evictions: u64,
}

/// Fixed-capacity LRU cache of flow fields.
#[derive(Clone, Debug)]
pub struct FlowFieldCache {
    slots: Vec<FlowSlot>,
    queue: Vec<u32>,
    stats: FlowStats,
}

impl FlowFieldCache {
    /// Pre-allocates `slots` flow fields over `shape`.
    ///
    /// # Panics
    ///
    /// Panics if `slots` is zero.
    #[must_use]
    pub fn new(shape: GridShape, slots: u32) -> Self {
        assert!(slots > 0, "Flow field cache needs at least one slot");
        Self {
            slots: (0..slots)
                .map(|_| FlowSlot {
                    field: FlowField::new(shape),
                    valid: false,
                    last_used: 0,
                })
                .collect(),
            queue: Vec::with_capacity(shape.cell_count()),
            stats: FlowStats::default(),
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots holding a valid field.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.slots.iter().filter(|slot| slot.valid).count()
    }

    /// Returns hit, miss and eviction counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> FlowStats {
        self.stats
    }

    /// Returns the field toward `destination`, computing it on a miss.
    ///
    /// `frame` stamps the slot for LRU ordering. Returns `None` if the
    /// destination is blocked or off the grid.
    pub fn field(
        &mut self,
        destination: Cell,
        frame: u64,
        occupancy: &OccupancyGrid,
    ) -> Option<&FlowField> {
        if occupancy.is_occupied(destination) {
            return None;
        }

        if let Some(index) = self
            .slots
            .iter()
            .position(|slot| slot.valid && slot.field.destination == destination)
        {
            self.stats.hits += 1;
            let slot = &mut self.slots[index];
            slot.last_used = frame;
            return Some(&slot.field);
        }

        let victim = self
            .slots
            .iter()
            .position(|slot| !slot.valid)
            .or_else(|| {
                self.slots
                    .iter()
                    .enumerate()
                    .min_by_key(|(index, slot)| (slot.last_used, *index))
                    .map(|(index, _)| index)
            })?;

        self.stats.misses += 1;
        let slot = &mut self.slots[victim];
        if slot.valid {
            self.stats.evictions += 1;
        }
        slot.field.compute(destination, occupancy, &mut self.queue);
        slot.valid = true;
        slot.last_used = frame;
        Some(&slot.field)
    }
}

impl DerivedCache for FlowFieldCache {
    type Deps<'a> = &'a OccupancyGrid;

    fn name(&self) -> &'static str {
        "flow_fields"
    }

    fn invalidate(&mut self) {
        for slot in &mut self.slots {
            slot.valid = false;
            slot.last_used = 0;
        }
        self.stats = FlowStats::default();
    }

    /// Lazy: never rebuilt by the pipeline.
    fn is_dirty(&self) -> bool {
        false
    }

    fn rebuild(&mut self, _world: &World, _occupancy: &OccupancyGrid) {}
}
