//! # Reference Systems
//!
//! A small deterministic match built on the substrate: a countdown, wave
//! spawning, flow-field movement, power-dependent attrition and cleanup of
//! dead units. Every system is integer-only and keeps no state outside the
//! tables.

mod attrition;
mod cleanup;
mod countdown;
mod movement;
mod spawn;

pub use attrition::AttritionSystem;
pub use cleanup::CleanupSystem;
pub use countdown::CountdownSystem;
pub use movement::MovementSystem;
pub use spawn::{SpawnWaveSystem, SPAWN_PURPOSE};

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::tick::Simulation;

/// Registers every reference system in execution order.
///
/// # Errors
///
/// Fails if `sim` has already run a frame or a schedule is invalid.
pub fn register_reference_systems(sim: &mut Simulation, config: &SimConfig) -> SimResult<()> {
    let rules = &config.rules;
    let schedules = &config.systems;
    sim.add_system(CountdownSystem::new(rules.max_waves), schedules.countdown)?;
    sim.add_system(SpawnWaveSystem::new(rules.units_per_wave), schedules.spawn_wave)?;
    sim.add_system(MovementSystem, schedules.movement)?;
    sim.add_system(
        AttritionSystem::new(rules.attrition_damage, rules.regeneration),
        schedules.attrition,
    )?;
    sim.add_system(CleanupSystem::new(rules.release_after_frames), schedules.cleanup)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::SimConfig;
    use crate::derived::DerivedCaches;
    use crate::tick::{InputSource, TickContext};
    use crate::world::World;

    pub fn config() -> SimConfig {
        let mut config = SimConfig::default();
        config.tables.units = 32;
        config.tables.buildings = 8;
        config.grid.width = 16;
        config.grid.height = 16;
        config.grid.sector_size = 4;
        config.grid.flow_field_slots = 4;
        config
    }

    pub fn setup(config: &SimConfig) -> (World, DerivedCaches) {
        let world = World::new(config);
        let mut derived = DerivedCaches::new(config);
        derived.rebuild_all(&world);
        (world, derived)
    }

    pub fn ctx(inputs: &dyn InputSource, frame: u64) -> TickContext<'_> {
        TickContext {
            frame,
            player_count: 2,
            session_seed: 9,
            inputs,
        }
    }
}
