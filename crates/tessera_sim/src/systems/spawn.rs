//! Seeded wave spawning.

use rand::Rng;

use crate::derived::DerivedCaches;
use crate::error::SimResult;
use crate::tick::{System, TickContext};
use crate::world::{Cell, MatchPhase, UnitSpawn, World};

/// RNG purpose tag for spawn positions.
pub const SPAWN_PURPOSE: u64 = 0x5350_4157_4E00_0001;

/// Draws per unit before giving up on finding a free cell.
const PLACEMENT_ATTEMPTS: u32 = 8;

/// Spawns a wave of units for every player while the match is running.
///
/// Positions and targets are drawn from the per-frame RNG and retried on
/// occupied cells; a unit that finds no free cell is skipped. Running out of
/// unit capacity aborts the frame.
#[derive(Clone, Copy, Debug)]
pub struct SpawnWaveSystem {
    units_per_wave: u32,
}

impl SpawnWaveSystem {
    /// Creates the system.
    #[must_use]
    pub const fn new(units_per_wave: u32) -> Self {
        Self { units_per_wave }
    }
}

impl System for SpawnWaveSystem {
    fn name(&self) -> &'static str {
        "spawn_wave"
    }

    fn run(
        &mut self,
        world: &mut World,
        derived: &mut DerivedCaches,
        ctx: &TickContext<'_>,
    ) -> SimResult<()> {
        if world.match_state().phase() != MatchPhase::Running {
            return Ok(());
        }

        let occupancy = &derived.occupancy;
        let shape = occupancy.shape();
        let mut rng = ctx.rng(SPAWN_PURPOSE);
        let free_cell = |rng: &mut rand_chacha::ChaCha8Rng| {
            (0..PLACEMENT_ATTEMPTS)
                .map(|_| Cell::new(rng.gen_range(0..shape.width), rng.gen_range(0..shape.height)))
                .find(|&cell| occupancy.is_free(cell))
        };

        let mut spawned = 0;
        for owner in 0..ctx.player_count {
            for _ in 0..self.units_per_wave {
                let Some(position) = free_cell(&mut rng) else {
                    continue;
                };
                let target = free_cell(&mut rng).unwrap_or(position);
                world.units.spawn(UnitSpawn {
                    position,
                    target,
                    owner,
                })?;
                spawned += 1;
            }
        }

        world.counters_mut().spawned += spawned;
        let state = world.match_state.get_mut();
        state.wave += 1;
        tracing::debug!(frame = ctx.frame, wave = state.wave, spawned, "Spawned wave");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::systems::test_support::{config, ctx, setup};
    use crate::tick::NoInput;
    use tessera_core::{CoreError, Table};

    fn running_config() -> crate::config::SimConfig {
        let mut config = config();
        config.rules.countdown_frames = 0;
        config
    }

    #[test]
    fn test_no_spawn_during_countdown() {
        let mut config = config();
        config.rules.countdown_frames = 10;
        let (mut world, mut derived) = setup(&config);
        SpawnWaveSystem::new(3)
            .run(&mut world, &mut derived, &ctx(&NoInput, 0))
            .unwrap();
        assert_eq!(world.units.live_count(), 0);
    }

    #[test]
    fn test_wave_per_player() {
        let config = running_config();
        let (mut world, mut derived) = setup(&config);
        SpawnWaveSystem::new(3)
            .run(&mut world, &mut derived, &ctx(&NoInput, 0))
            .unwrap();
        assert_eq!(world.units.live_count(), 6);
        assert_eq!(world.counters().spawned, 6);
        assert_eq!(world.match_state().wave, 1);
    }

    #[test]
    fn test_same_seed_same_wave() {
        let config = running_config();
        let (mut a, mut derived_a) = setup(&config);
        let (mut b, mut derived_b) = setup(&config);
        SpawnWaveSystem::new(4).run(&mut a, &mut derived_a, &ctx(&NoInput, 5)).unwrap();
        SpawnWaveSystem::new(4).run(&mut b, &mut derived_b, &ctx(&NoInput, 5)).unwrap();
        assert_eq!(a.compute_state_hash(), b.compute_state_hash());

        let (mut c, mut derived_c) = setup(&config);
        SpawnWaveSystem::new(4).run(&mut c, &mut derived_c, &ctx(&NoInput, 6)).unwrap();
        assert_ne!(a.compute_state_hash(), c.compute_state_hash());
    }

    #[test]
    fn test_capacity_exhaustion_is_fatal() {
        let mut config = running_config();
        config.tables.units = 4;
        let (mut world, mut derived) = setup(&config);
        let err = SpawnWaveSystem::new(3)
            .run(&mut world, &mut derived, &ctx(&NoInput, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Core(CoreError::CapacityExhausted { capacity: 4, .. })
        ));
    }
}
