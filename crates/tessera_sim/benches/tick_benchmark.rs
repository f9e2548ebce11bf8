//! # Tick Pipeline Benchmark
//!
//! Measures a full reference-match frame, hashing cost, and derived cache
//! rebuilds at production table sizes.
//!
//! Run with: `cargo bench --package tessera_sim`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_sim::derived::DerivedCaches;
use tessera_sim::world::{BuildingKind, BuildingSpawn, Cell, Footprint, UnitSpawn};
use tessera_sim::{NoInput, SimConfig, Simulation, World};

/// Builds a world with `units` live units and a grid of buildings.
fn populated_world(config: &SimConfig, units: u32) -> World {
    let mut world = World::new(config);
    for i in 0..64 {
        world
            .buildings
            .place(BuildingSpawn {
                footprint: Footprint::new((i % 8) * 14 + 4, (i / 8) * 14 + 4, 3, 3),
                kind: if i % 5 == 0 {
                    BuildingKind::Generator
                } else {
                    BuildingKind::Structure
                },
                owner: (i % 2) as u8,
            })
            .unwrap();
    }
    for i in 0..units {
        let x = (i % 128) as i32;
        let y = ((i / 128) % 128) as i32;
        world
            .units
            .spawn(UnitSpawn {
                position: Cell::new(x, y),
                target: Cell::new(127 - x, 127 - y),
                owner: (i % 2) as u8,
            })
            .unwrap();
    }
    world
}

/// Benchmark: whole-world state hash.
fn bench_state_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_hash");
    for units in [256, 1024, 4096] {
        let config = SimConfig::default();
        let world = populated_world(&config, units);
        group.bench_with_input(BenchmarkId::from_parameter(units), &world, |b, world| {
            b.iter(|| black_box(world.compute_state_hash()));
        });
    }
    group.finish();
}

/// Benchmark: eager derived cache rebuild after invalidation.
fn bench_derived_rebuild(c: &mut Criterion) {
    let config = SimConfig::default();
    let world = populated_world(&config, 0);
    let mut derived = DerivedCaches::new(&config);

    c.bench_function("derived_rebuild_all", |b| {
        b.iter(|| {
            derived.invalidate_all();
            black_box(derived.rebuild_all(&world))
        });
    });
}

/// Benchmark: one reference-match frame.
fn bench_tick(c: &mut Criterion) {
    let mut config = SimConfig::default();
    config.rules.countdown_frames = 0;
    config.systems.spawn_wave.interval = 1_000_000;

    let mut group = c.benchmark_group("tick");
    for units in [256, 1024] {
        let mut sim = Simulation::with_reference_systems(&config).unwrap();
        sim.reset(Some(1)).unwrap();
        *sim.world_mut() = populated_world(&config, units);

        group.bench_function(BenchmarkId::new("plain", units), |b| {
            b.iter(|| black_box(sim.tick(2, &NoInput).unwrap()));
        });
        group.bench_function(BenchmarkId::new("with_hashes", units), |b| {
            b.iter(|| black_box(sim.tick_with_hashes(2, &NoInput).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_state_hash, bench_derived_rebuild, bench_tick);
criterion_main!(benches);
