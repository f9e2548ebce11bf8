//! Flow-field movement.

use tessera_core::Slot;

use crate::derived::DerivedCaches;
use crate::error::SimResult;
use crate::tick::{System, TickContext, BUTTON_RETARGET};
use crate::world::World;

/// Applies retarget input, then advances each active unit one cell along
/// the flow field toward its target.
///
/// Units are visited in slot order. Units with an unreachable target stay
/// put.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn run(
        &mut self,
        world: &mut World,
        derived: &mut DerivedCaches,
        ctx: &TickContext<'_>,
    ) -> SimResult<()> {
        let capacity = world.units.capacity();

        for player in 0..ctx.player_count {
            let input = ctx.inputs.player_input(player);
            if !input.pressed(BUTTON_RETARGET) {
                continue;
            }
            for raw in 0..capacity {
                if let Some(row) = world.units.try_row_mut(Slot(raw)) {
                    if *row.owner == player && row.is_active() {
                        *row.target = input.target;
                    }
                }
            }
        }

        for raw in 0..capacity {
            let slot = Slot(raw);
            let Some(unit) = world.units.try_row(slot) else {
                continue;
            };
            if !unit.is_active() {
                continue;
            }
            if let Some(next) = derived.step_toward(unit.position, unit.target, ctx.frame) {
                if let Some(row) = world.units.try_row_mut(slot) {
                    *row.position = next;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::test_support::{config, ctx, setup};
    use crate::tick::{NoInput, PlayerInput};
    use crate::world::{BuildingKind, BuildingSpawn, Cell, Footprint, UnitSpawn};

    #[test]
    fn test_unit_walks_to_target() {
        let config = config();
        let (mut world, mut derived) = setup(&config);
        let unit = world
            .units
            .spawn(UnitSpawn {
                position: Cell::new(0, 0),
                target: Cell::new(3, 0),
                owner: 0,
            })
            .unwrap();

        for frame in 0..5 {
            MovementSystem
                .run(&mut world, &mut derived, &ctx(&NoInput, frame))
                .unwrap();
        }
        assert_eq!(world.units.row(unit).unwrap().position, Cell::new(3, 0));
    }

    #[test]
    fn test_walled_off_target_stays_put() {
        let config = config();
        let mut world = crate::world::World::new(&config);
        world
            .buildings
            .place(BuildingSpawn {
                footprint: Footprint::new(8, 0, 1, 16),
                kind: BuildingKind::Structure,
                owner: 0,
            })
            .unwrap();
        let mut derived = crate::derived::DerivedCaches::new(&config);
        derived.rebuild_all(&world);
        let unit = world
            .units
            .spawn(UnitSpawn {
                position: Cell::new(0, 0),
                target: Cell::new(12, 0),
                owner: 0,
            })
            .unwrap();

        MovementSystem.run(&mut world, &mut derived, &ctx(&NoInput, 0)).unwrap();
        assert_eq!(world.units.row(unit).unwrap().position, Cell::new(0, 0));
    }

    #[test]
    fn test_retarget_only_own_units() {
        let config = config();
        let (mut world, mut derived) = setup(&config);
        let spawn = |owner| UnitSpawn {
            position: Cell::new(5, 5),
            target: Cell::new(5, 5),
            owner,
        };
        let mine = world.units.spawn(spawn(0)).unwrap();
        let theirs = world.units.spawn(spawn(1)).unwrap();

        let inputs = [PlayerInput {
            target: Cell::new(9, 5),
            buttons: BUTTON_RETARGET,
        }];
        MovementSystem.run(&mut world, &mut derived, &ctx(&inputs, 0)).unwrap();

        let mine = world.units.row(mine).unwrap();
        assert_eq!(mine.target, Cell::new(9, 5));
        assert_eq!(mine.position, Cell::new(6, 5));
        assert_eq!(world.units.row(theirs).unwrap().target, Cell::new(5, 5));
    }
}
