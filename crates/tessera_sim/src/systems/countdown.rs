//! Match phase progression.

use tessera_core::Table;

use crate::derived::DerivedCaches;
use crate::error::SimResult;
use crate::tick::{System, TickContext};
use crate::world::{MatchPhase, World, NO_WINNER};

/// Counts the pre-match countdown down and ends finished matches.
///
/// A running match finishes once `max_waves` waves have spawned and no
/// unit is active. The winner is the owner with the most active buildings,
/// lowest owner first on ties.
#[derive(Clone, Copy, Debug)]
pub struct CountdownSystem {
    max_waves: u32,
}

impl CountdownSystem {
    /// Creates the system; `max_waves == 0` never ends the match.
    #[must_use]
    pub const fn new(max_waves: u32) -> Self {
        Self { max_waves }
    }

    fn any_unit_active(world: &World) -> bool {
        world
            .units
            .index()
            .iter_live()
            .any(|(slot, _)| world.units.is_active(slot))
    }

    fn leading_owner(world: &World) -> u32 {
        let mut counts = [0u32; 256];
        for (_, row) in world.buildings.iter_active() {
            counts[usize::from(row.owner)] += 1;
        }
        let mut winner = NO_WINNER;
        let mut best = 0;
        for (owner, &count) in counts.iter().enumerate() {
            if count > best {
                best = count;
                winner = owner as u32;
            }
        }
        winner
    }
}

impl System for CountdownSystem {
    fn name(&self) -> &'static str {
        "countdown"
    }

    fn run(&mut self, world: &mut World, _: &mut DerivedCaches, ctx: &TickContext<'_>) -> SimResult<()> {
        let state = *world.match_state();
        match state.phase() {
            MatchPhase::Countdown => {
                let state = world.match_state.get_mut();
                state.countdown_frames = state.countdown_frames.saturating_sub(1);
                if state.countdown_frames == 0 {
                    state.phase = MatchPhase::Running.as_raw();
                    tracing::info!(frame = ctx.frame, "Match started");
                }
            }
            MatchPhase::Running => {
                let done = self.max_waves > 0
                    && state.wave >= self.max_waves
                    && !Self::any_unit_active(world);
                if done {
                    let winner = Self::leading_owner(world);
                    let state = world.match_state.get_mut();
                    state.phase = MatchPhase::Finished.as_raw();
                    state.winner = winner;
                    tracing::info!(frame = ctx.frame, winner, "Match finished");
                }
            }
            MatchPhase::Finished => {}
        }
        Ok(())
    }
}
