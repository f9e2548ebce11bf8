//! Power-dependent health.

use tessera_core::Slot;

use crate::derived::DerivedCaches;
use crate::error::SimResult;
use crate::tick::{System, TickContext};
use crate::world::{World, UNIT_MAX_HEALTH};

/// Damages active units outside power coverage and heals those inside,
/// capped at [`UNIT_MAX_HEALTH`].
#[derive(Clone, Copy, Debug)]
pub struct AttritionSystem {
    damage: i32,
    regeneration: i32,
}

impl AttritionSystem {
    /// Creates the system.
    #[must_use]
    pub const fn new(damage: i32, regeneration: i32) -> Self {
        Self {
            damage,
            regeneration,
        }
    }
}

impl System for AttritionSystem {
    fn name(&self) -> &'static str {
        "attrition"
    }

    fn run(&mut self, world: &mut World, derived: &mut DerivedCaches, _: &TickContext<'_>) -> SimResult<()> {
        let mut damage_events = 0;
        for raw in 0..world.units.capacity() {
            let Some(row) = world.units.try_row_mut(Slot(raw)) else {
                continue;
            };
            if !row.is_active() {
                continue;
            }
            if derived.power.is_cell_powered(*row.position) {
                *row.health = row.health.saturating_add(self.regeneration).min(UNIT_MAX_HEALTH);
            } else {
                *row.health = row.health.saturating_sub(self.damage);
                damage_events += 1;
            }
        }
        world.counters_mut().damage_events += damage_events;
        Ok(())
    }
}
