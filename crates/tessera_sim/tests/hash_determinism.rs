//! # Hash Determinism
//!
//! Independent replicas fed identical operations hash identically every
//! frame; one differing mutation diverges from that frame on, never before,
//! and the per-system history pins down which system diverged.

use tessera_core::Table;
use tessera_sim::derived::DerivedCaches;
use tessera_sim::diagnostics::first_divergence;
use tessera_sim::systems::{MovementSystem, SpawnWaveSystem};
use tessera_sim::tick::BUTTON_RETARGET;
use tessera_sim::world::{BuildingKind, BuildingSpawn, Cell, Footprint};
use tessera_sim::{
    PlayerInput, Schedule, SimConfig, SimResult, Simulation, System, TickContext, World,
};

fn config() -> SimConfig {
    let mut config = SimConfig::default();
    config.tables.units = 512;
    config.tables.buildings = 32;
    config.grid.width = 48;
    config.grid.height = 48;
    config.grid.sector_size = 8;
    config.rules.countdown_frames = 5;
    config.systems.spawn_wave.interval = 15;
    config
}

fn replica() -> Simulation {
    let mut sim = Simulation::with_reference_systems(&config()).unwrap();
    sim.reset(Some(0xDEAD_BEEF)).unwrap();
    sim
}

fn inputs(frame: u64) -> [PlayerInput; 2] {
    let retarget = |x: i32, y: i32| PlayerInput {
        target: Cell::new(x, y),
        buttons: if frame % 17 == 0 { BUTTON_RETARGET } else { 0 },
    };
    [
        retarget((frame % 48) as i32, 10),
        retarget(40, (frame % 48) as i32),
    ]
}

fn wall(world: &mut World, x: i32) {
    world
        .buildings
        .place(BuildingSpawn {
            footprint: Footprint::new(x, 20, 1, 8),
            kind: BuildingKind::Structure,
            owner: 1,
        })
        .unwrap();
}

/// Test: two replicas agree on every frame.
#[test]
fn test_identical_sequences_identical_hashes() {
    let mut a = replica();
    let mut b = replica();
    wall(a.world_mut(), 12);
    wall(b.world_mut(), 12);

    for frame in 0..120 {
        a.tick(2, &inputs(frame)).unwrap();
        b.tick(2, &inputs(frame)).unwrap();
        assert_eq!(a.state_hash(), b.state_hash(), "frame {frame}");
        assert_eq!(a.table_hashes(), b.table_hashes(), "frame {frame}");
    }
    assert!(a.world().units.live_count() > 0);
}

/// Test: a mutation applied only to one replica diverges from that frame on.
#[test]
fn test_single_mutation_diverges_from_that_frame() {
    const MUTATION_FRAME: u64 = 40;
    let mut a = replica();
    let mut b = replica();

    for frame in 0..100 {
        if frame == MUTATION_FRAME {
            wall(b.world_mut(), 30);
        }
        a.tick(2, &inputs(frame)).unwrap();
        b.tick(2, &inputs(frame)).unwrap();

        if frame < MUTATION_FRAME {
            assert_eq!(a.state_hash(), b.state_hash(), "early divergence at {frame}");
        } else {
            assert_ne!(a.state_hash(), b.state_hash(), "reconverged at {frame}");
        }
    }

    let diff: Vec<&str> = a.table_hashes().diff(&b.table_hashes()).collect();
    assert!(diff.contains(&"buildings"));
}

/// Adds a building on one frame when enabled.
struct Tweak {
    enabled: bool,
    frame: u64,
}

impl System for Tweak {
    fn name(&self) -> &'static str {
        "tweak"
    }

    fn run(&mut self, world: &mut World, _: &mut DerivedCaches, ctx: &TickContext<'_>) -> SimResult<()> {
        if self.enabled && ctx.frame == self.frame {
            wall(world, 2);
        }
        Ok(())
    }
}

/// Test: per-system hash arrays bisect the divergence to one system.
#[test]
fn test_per_system_bisection() {
    let mut config = config();
    config.rules.countdown_frames = 0;
    let build = |enabled| {
        let mut sim = Simulation::new(&config).unwrap();
        sim.add_system(SpawnWaveSystem::new(3), Schedule::new(4, 0)).unwrap();
        sim.add_system(Tweak { enabled, frame: 6 }, Schedule::EVERY_FRAME).unwrap();
        sim.add_system(MovementSystem, Schedule::EVERY_FRAME).unwrap();
        sim.reset(Some(5)).unwrap();
        sim
    };
    let mut honest = build(false);
    let mut tweaked = build(true);

    for frame in 0..10 {
        honest.tick_with_hashes(2, &inputs(frame)).unwrap();
        tweaked.tick_with_hashes(2, &inputs(frame)).unwrap();
    }

    for frame in 0..6 {
        assert_eq!(honest.system_hashes(frame), tweaked.system_hashes(frame));
    }
    let local = honest.system_hashes(6).unwrap();
    let remote = tweaked.system_hashes(6).unwrap();
    assert_eq!(local.len(), 4);
    let index = first_divergence(local, remote).unwrap();
    assert_eq!(honest.stage_label(index), Some("tweak"));

    // Frames after the divergence already differ at begin_frame.
    let later = first_divergence(
        honest.system_hashes(7).unwrap(),
        tweaked.system_hashes(7).unwrap(),
    );
    assert_eq!(later, Some(0));
}

/// Test: recording hashes does not change the simulation.
#[test]
fn test_recording_is_observational() {
    let mut plain = replica();
    let mut recorded = replica();
    for frame in 0..60 {
        plain.tick(2, &inputs(frame)).unwrap();
        recorded.tick_with_hashes(2, &inputs(frame)).unwrap();
        assert_eq!(plain.state_hash(), recorded.state_hash());
    }
    let last = recorded.system_hashes(59).unwrap();
    assert_eq!(*last.last().unwrap(), recorded.state_hash());
    assert_eq!(last.len(), recorded.system_names().len() + 1);
}
