//! # Presentation Sync
//!
//! Reconciles a view layer against the authoritative tables. Every view
//! entity carries a back-reference [`Handle`]; a pass deletes each entity
//! whose handle no longer resolves (released row) or whose row is no
//! longer active (soft-deactivated row). Both orphan channels converge
//! within a single pass.
//!
//! Stable identifiers are never reused, so a recycled slot can never make a
//! stale handle look valid; this pass relies on that and does not re-check.

use tessera_core::{Handle, Liveness};

use crate::world::World;

/// The capability presentation sync needs from a view layer.
pub trait ViewWorld {
    /// View-side entity identity.
    type Entity: Copy;

    /// Appends every entity carrying a back-reference, with its handle.
    fn collect_tagged(&self, out: &mut Vec<(Self::Entity, Handle)>);

    /// Deletes `entity`.
    fn despawn(&mut self, entity: Self::Entity);
}

/// Outcome of one sync pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tagged entities examined.
    pub examined: u32,
    /// Deleted because the row was released.
    pub deleted_released: u32,
    /// Deleted because the row was inactive.
    pub deleted_inactive: u32,
}

impl SyncReport {
    /// Total deletions.
    #[inline]
    #[must_use]
    pub const fn deleted(&self) -> u32 {
        self.deleted_released + self.deleted_inactive
    }
}

/// Reusable orphan reconciler.
#[derive(Debug)]
pub struct PresentationSync<E> {
    scratch: Vec<(E, Handle)>,
    last: SyncReport,
}

impl<E: Copy> PresentationSync<E> {
    /// Creates a reconciler expecting roughly `expected_entities` tags.
    #[must_use]
    pub fn new(expected_entities: usize) -> Self {
        Self {
            scratch: Vec::with_capacity(expected_entities),
            last: SyncReport::default(),
        }
    }

    /// Report of the most recent pass.
    #[inline]
    #[must_use]
    pub const fn last_report(&self) -> SyncReport {
        self.last
    }

    /// Deletes every orphaned view entity.
    pub fn reconcile<V>(&mut self, world: &World, view: &mut V) -> SyncReport
    where
        V: ViewWorld<Entity = E>,
    {
        self.scratch.clear();
        view.collect_tagged(&mut self.scratch);

        let mut report = SyncReport::default();
        for &(entity, handle) in &self.scratch {
            report.examined += 1;
            match world.liveness(handle) {
                Liveness::Live => {}
                Liveness::Missing => {
                    view.despawn(entity);
                    report.deleted_released += 1;
                }
                Liveness::Inactive => {
                    view.despawn(entity);
                    report.deleted_inactive += 1;
                }
            }
        }

        if report.deleted() > 0 {
            tracing::warn!(
                released = report.deleted_released,
                inactive = report.deleted_inactive,
                "Presentation sync deleted orphaned view entities"
            );
        }
        self.last = report;
        report
    }
}

/// Minimal in-memory view layer: a slot list of tagged entities.
#[derive(Clone, Debug, Default)]
pub struct TaggedViews {
    entities: Vec<Option<Handle>>,
}

impl TaggedViews {
    /// Creates an empty view layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity tagged with `handle` and returns its identity.
    pub fn spawn(&mut self, handle: Handle) -> usize {
        self.entities.push(Some(handle));
        self.entities.len() - 1
    }

    /// Number of entities still present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.iter().flatten().count()
    }

    /// Checks if no entities are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks whether `entity` is still present.
    #[must_use]
    pub fn contains(&self, entity: usize) -> bool {
        self.entities.get(entity).is_some_and(Option::is_some)
    }
}

impl ViewWorld for TaggedViews {
    type Entity = usize;

    fn collect_tagged(&self, out: &mut Vec<(usize, Handle)>) {
        out.extend(
            self.entities
                .iter()
                .enumerate()
                .filter_map(|(entity, tag)| tag.map(|handle| (entity, handle))),
        );
    }

    fn despawn(&mut self, entity: usize) {
        if let Some(tag) = self.entities.get_mut(entity) {
            *tag = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::world::{Cell, UnitSpawn};
    use tessera_core::{StableId, TableId};

    fn world() -> World {
        let mut config = SimConfig::default();
        config.tables.units = 8;
        config.tables.buildings = 4;
        World::new(&config)
    }

    fn spawn(world: &mut World) -> Handle {
        world
            .units
            .spawn(UnitSpawn {
                position: Cell::new(0, 0),
                target: Cell::new(0, 0),
                owner: 0,
            })
            .unwrap()
    }

    #[test]
    fn test_both_orphan_channels() {
        let mut world = world();
        let live = spawn(&mut world);
        let released = spawn(&mut world);
        let inactive = spawn(&mut world);

        let mut views = TaggedViews::new();
        let live_view = views.spawn(live);
        views.spawn(released);
        views.spawn(inactive);

        world.release(released);
        world.units.row_mut(inactive).unwrap().set_active(false);

        let mut sync = PresentationSync::new(8);
        let report = sync.reconcile(&world, &mut views);
        assert_eq!(
            report,
            SyncReport {
                examined: 3,
                deleted_released: 1,
                deleted_inactive: 1,
            }
        );
        assert_eq!(views.len(), 1);
        assert!(views.contains(live_view));
    }

    #[test]
    fn test_unknown_table_counts_as_released() {
        let world = world();
        let mut views = TaggedViews::new();
        views.spawn(Handle::new(StableId(1), TableId(99)));

        let mut sync = PresentationSync::new(1);
        assert_eq!(sync.reconcile(&world, &mut views).deleted_released, 1);
        assert!(views.is_empty());
    }

    #[test]
    fn test_clean_pass_deletes_nothing() {
        let mut world = world();
        let mut views = TaggedViews::new();
        views.spawn(spawn(&mut world));

        let mut sync = PresentationSync::new(1);
        assert_eq!(sync.reconcile(&world, &mut views).deleted(), 0);
        assert_eq!(sync.last_report().examined, 1);
    }
}
