//! # Derived Caches
//!
//! Non-authoritative data recomputed from the tables. Nothing here is ever
//! hashed or snapshotted for correctness; after a rollback the whole set is
//! invalidated and rebuilt from the restored tables.
//!
//! ## Protocol
//!
//! - **Eager** caches ([`OccupancyGrid`], [`PowerCoverage`]) are rebuilt in
//!   dependency order at the start of every frame while dirty.
//! - **Lazy** caches ([`ZoneGraph`], [`FlowFieldCache`]) never report dirty;
//!   they compute on first query and invalidation only forgets results.
//!
//! Any change to the building table's revision invalidates every cache.

mod flow;
mod grid;
mod occupancy;
mod power;
mod zones;

pub use flow::{FlowField, FlowFieldCache, FlowStats, UNREACHABLE};
pub use grid::{BitGrid, GridShape};
pub use occupancy::OccupancyGrid;
pub use power::PowerCoverage;
pub use zones::{ZoneGraph, ZoneId};

use crate::config::SimConfig;
use crate::world::{Cell, World};

/// A cache computed from authoritative tables.
///
/// Implementors must never mutate tables. [`DerivedCache::rebuild`] is a
/// no-op unless the cache is dirty.
pub trait DerivedCache {
    /// Earlier caches read while rebuilding.
    type Deps<'a>;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Marks the contents stale.
    fn invalidate(&mut self);

    /// Checks whether the next rebuild has work to do.
    fn is_dirty(&self) -> bool;

    /// Recomputes the contents from `world` if dirty.
    fn rebuild(&mut self, world: &World, deps: Self::Deps<'_>);
}

/// One derived cache of [`DerivedCaches`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStage {
    /// [`OccupancyGrid`].
    Occupancy,
    /// [`PowerCoverage`], reads occupancy.
    Power,
    /// [`ZoneGraph`], reads occupancy.
    Zones,
    /// [`FlowFieldCache`], reads occupancy.
    FlowFields,
}

/// Order in which [`DerivedCaches::rebuild_all`] visits the caches. Every
/// stage comes after the stages it reads.
pub const REBUILD_ORDER: [CacheStage; 4] = [
    CacheStage::Occupancy,
    CacheStage::Power,
    CacheStage::Zones,
    CacheStage::FlowFields,
];

/// Every derived cache of the simulation.
#[derive(Clone, Debug)]
pub struct DerivedCaches {
    /// Blocked cells.
    pub occupancy: OccupancyGrid,
    /// Generator networks, depends on occupancy.
    pub power: PowerCoverage,
    /// Sector reachability, depends on occupancy.
    pub zones: ZoneGraph,
    /// Pathing distances, depends on occupancy.
    pub flow: FlowFieldCache,
    seen_revision: Option<u64>,
}

impl DerivedCaches {
    /// Creates the caches sized from `config`, all dirty.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        let shape = GridShape::from_config(&config.grid);
        Self {
            occupancy: OccupancyGrid::new(shape),
            power: PowerCoverage::new(shape, config.tables.buildings),
            zones: ZoneGraph::new(shape, u32::from(config.grid.sector_size)),
            flow: FlowFieldCache::new(shape, u32::from(config.grid.flow_field_slots)),
            seen_revision: None,
        }
    }

    /// Invalidates every cache.
    pub fn invalidate_all(&mut self) {
        self.occupancy.invalidate();
        self.power.invalidate();
        self.zones.invalidate();
        self.flow.invalidate();
        self.seen_revision = None;
    }

    /// Rebuilds every dirty eager cache in dependency order.
    ///
    /// Returns the number of caches that did work.
    pub fn rebuild_all(&mut self, world: &World) -> usize {
        let revision = world.buildings.revision();
        if self.seen_revision != Some(revision) {
            self.invalidate_all();
            self.seen_revision = Some(revision);
            tracing::debug!(revision, "Building layout changed, derived caches invalidated");
        }

        REBUILD_ORDER
            .into_iter()
            .filter(|&stage| self.rebuild_stage(stage, world))
            .count()
    }

    /// Rebuilds one cache if dirty; returns whether it did work.
    fn rebuild_stage(&mut self, stage: CacheStage, world: &World) -> bool {
        let dirty = self.name_and_dirty(stage).1;
        match stage {
            CacheStage::Occupancy => self.occupancy.rebuild(world, ()),
            CacheStage::Power => self.power.rebuild(world, &self.occupancy),
            CacheStage::Zones => self.zones.rebuild(world, &self.occupancy),
            CacheStage::FlowFields => self.flow.rebuild(world, &self.occupancy),
        }
        dirty
    }

    /// Log name and dirty state of one cache.
    #[must_use]
    pub fn name_and_dirty(&self, stage: CacheStage) -> (&'static str, bool) {
        match stage {
            CacheStage::Occupancy => (self.occupancy.name(), self.occupancy.is_dirty()),
            CacheStage::Power => (self.power.name(), self.power.is_dirty()),
            CacheStage::Zones => (self.zones.name(), self.zones.is_dirty()),
            CacheStage::FlowFields => (self.flow.name(), self.flow.is_dirty()),
        }
    }

    /// Returns the next cell on a shortest path from `from` to `to`.
    ///
    /// Consults the zone graph first so unreachable targets never cost a
    /// flow field. Returns `None` when already there or unreachable.
    pub fn step_toward(&mut self, from: Cell, to: Cell, frame: u64) -> Option<Cell> {
        if from == to || !self.zones.reachable(from, to, &self.occupancy) {
            return None;
        }
        self.flow.field(to, frame, &self.occupancy)?.next_step(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BuildingKind, BuildingSpawn, Footprint};

    fn config() -> SimConfig {
        let mut config = SimConfig::default();
        config.grid.width = 16;
        config.grid.height = 16;
        config.grid.sector_size = 4;
        config.grid.flow_field_slots = 2;
        config.tables.buildings = 8;
        config
    }

    fn wall(world: &mut World, footprint: Footprint) {
        world
            .buildings
            .place(BuildingSpawn {
                footprint,
                kind: BuildingKind::Structure,
                owner: 0,
            })
            .unwrap();
    }

    #[test]
    fn test_first_rebuild_does_eager_work() {
        let config = config();
        let world = World::new(&config);
        let mut derived = DerivedCaches::new(&config);
        assert_eq!(derived.rebuild_all(&world), 2);
        assert_eq!(derived.rebuild_all(&world), 0);
    }

    #[test]
    fn test_building_change_invalidates() {
        let config = config();
        let mut world = World::new(&config);
        let mut derived = DerivedCaches::new(&config);
        derived.rebuild_all(&world);

        wall(&mut world, Footprint::new(2, 2, 2, 2));
        assert_eq!(derived.rebuild_all(&world), 2);
        assert_eq!(derived.occupancy.occupied_count(), 4);
    }

    #[test]
    fn test_far_off_grid_footprints_rebuild() {
        let config = config();
        let mut world = World::new(&config);
        wall(&mut world, Footprint::new(i32::MAX - 1, 0, 4, 1));
        wall(&mut world, Footprint::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX));
        wall(&mut world, Footprint::new(15, 15, i32::MAX, i32::MAX));

        let mut derived = DerivedCaches::new(&config);
        assert_eq!(derived.rebuild_all(&world), 2);
        assert_eq!(derived.occupancy.occupied_count(), 1);
        assert!(derived.occupancy.is_occupied(Cell::new(15, 15)));
    }

    #[test]
    fn test_step_toward() {
        let config = config();
        let mut world = World::new(&config);
        wall(&mut world, Footprint::new(8, 0, 1, 16));
        let mut derived = DerivedCaches::new(&config);
        derived.rebuild_all(&world);

        assert_eq!(
            derived.step_toward(Cell::new(0, 0), Cell::new(2, 0), 1),
            Some(Cell::new(1, 0))
        );
        assert_eq!(derived.step_toward(Cell::new(0, 0), Cell::new(12, 0), 1), None);
        assert_eq!(derived.step_toward(Cell::new(2, 0), Cell::new(2, 0), 1), None);
        assert_eq!(derived.flow.stats().misses, 1);
    }

    #[test]
    fn test_rebuild_order_cleans_eager_stages() {
        let config = config();
        let world = World::new(&config);
        let mut derived = DerivedCaches::new(&config);

        let names = REBUILD_ORDER.map(|stage| derived.name_and_dirty(stage).0);
        assert_eq!(names, ["occupancy", "power", "zones", "flow_fields"]);
        let dirty = REBUILD_ORDER.map(|stage| derived.name_and_dirty(stage).1);
        assert_eq!(dirty, [true, true, false, false]);

        derived.rebuild_all(&world);
        assert!(REBUILD_ORDER.iter().all(|&stage| !derived.name_and_dirty(stage).1));
    }
}
