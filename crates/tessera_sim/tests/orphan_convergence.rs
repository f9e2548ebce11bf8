//! # Orphan Convergence
//!
//! View entities backed by released or deactivated rows disappear on the
//! very next presentation sync.

use std::collections::HashSet;

use tessera_core::{Handle, Liveness, Table};
use tessera_sim::world::{Cell, UnitSpawn};
use tessera_sim::{NoInput, PresentationSync, SimConfig, Simulation, TaggedViews, World};

fn spawn(world: &mut World, x: i32) -> Handle {
    world
        .units
        .spawn(UnitSpawn {
            position: Cell::new(x, 0),
            target: Cell::new(x, 0),
            owner: 0,
        })
        .unwrap()
}

/// Test: three spawn/kill waves of 10, both channels, nothing left after
/// each wave's sync.
#[test]
fn test_three_waves_converge() {
    let mut config = SimConfig::default();
    config.tables.units = 16;
    let mut world = World::new(&config);
    let mut views = TaggedViews::new();
    let mut sync = PresentationSync::new(16);

    for wave in 0..3 {
        let handles: Vec<Handle> = (0..10).map(|x| spawn(&mut world, x)).collect();
        for &handle in &handles {
            views.spawn(handle);
        }
        assert_eq!(sync.reconcile(&world, &mut views).deleted(), 0);

        for (i, &handle) in handles.iter().enumerate() {
            if i % 2 == 0 {
                world.release(handle);
            } else {
                world.units.row_mut(handle).unwrap().set_active(false);
            }
        }

        let report = sync.reconcile(&world, &mut views);
        assert_eq!(report.deleted_released, 5, "wave {wave}");
        assert_eq!(report.deleted_inactive, 5, "wave {wave}");
        assert!(views.is_empty(), "wave {wave} left orphans");

        // Deactivated rows are released between waves so capacity holds.
        for handle in handles {
            world.release(handle);
        }
    }
}

/// Test: mirroring the reference match, every surviving view is live after
/// each sync.
#[test]
fn test_reference_match_never_keeps_orphans() {
    let mut config = SimConfig::default();
    config.tables.units = 256;
    config.grid.width = 32;
    config.grid.height = 32;
    config.grid.sector_size = 8;
    config.rules.countdown_frames = 2;
    config.rules.attrition_damage = 40;
    config.rules.release_after_frames = 3;
    config.systems.spawn_wave.interval = 10;
    config.systems.attrition.interval = 2;

    let mut sim = Simulation::with_reference_systems(&config).unwrap();
    sim.reset(Some(1234)).unwrap();

    let mut views = TaggedViews::new();
    let mut sync = PresentationSync::new(256);
    let mut mirrored = HashSet::new();
    let mut deleted = 0;

    for _ in 0..80 {
        sim.tick(2, &NoInput).unwrap();
        let world = sim.world();
        let live: Vec<Handle> = world
            .units
            .index()
            .iter_live()
            .filter(|&(slot, _)| world.units.is_active(slot))
            .map(|(_, id)| Handle::new(id, world.units.table_id()))
            .collect();
        for handle in live {
            if mirrored.insert(handle) {
                views.spawn(handle);
            }
        }

        deleted += sync.reconcile(world, &mut views).deleted();
        let mut remaining = Vec::new();
        tessera_sim::ViewWorld::collect_tagged(&views, &mut remaining);
        for (_, handle) in remaining {
            assert_eq!(world.liveness(handle), Liveness::Live);
        }
    }
    assert!(deleted > 0, "the match should have killed some units");
}
