//! Dead unit deactivation and row release.

use tessera_core::{Handle, Slot, Table};

use crate::derived::DerivedCaches;
use crate::error::SimResult;
use crate::tick::{System, TickContext};
use crate::world::World;

/// Deactivates units at or below zero health, then releases rows that have
/// stayed inactive for `release_after` runs.
///
/// The gap between deactivation and release is when the view layer sees the
/// soft-deactivated channel; presentation sync must cope with both.
#[derive(Clone, Copy, Debug)]
pub struct CleanupSystem {
    release_after: u32,
}

impl CleanupSystem {
    /// Creates the system. `release_after == 0` releases on the run after
    /// deactivation.
    #[must_use]
    pub const fn new(release_after: u32) -> Self {
        Self { release_after }
    }
}

impl System for CleanupSystem {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn run(&mut self, world: &mut World, _: &mut DerivedCaches, _: &TickContext<'_>) -> SimResult<()> {
        let table = world.units.table_id();
        for raw in 0..world.units.capacity() {
            let slot = Slot(raw);
            let Some(mut row) = world.units.try_row_mut(slot) else {
                continue;
            };

            if row.is_active() {
                if *row.health <= 0 {
                    row.set_active(false);
                    *row.idle_frames = 0;
                    world.counters_mut().deactivated += 1;
                }
                continue;
            }

            *row.idle_frames += 1;
            if *row.idle_frames > self.release_after {
                if let Some(id) = world.units.get_stable_id(slot) {
                    world.release(Handle::new(id, table));
                }
            }
        }
        Ok(())
    }
}
