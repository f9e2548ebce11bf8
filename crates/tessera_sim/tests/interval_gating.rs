//! # Interval Gating
//!
//! A system with interval `I` and offset `O` runs on frame `F` iff
//! `(F - O) mod I == 0`, observed through the real pipeline.

use std::cell::RefCell;
use std::rc::Rc;

use tessera_sim::derived::DerivedCaches;
use tessera_sim::{NoInput, Schedule, SimConfig, SimResult, Simulation, System, TickContext, World};

/// Records every frame it runs on.
struct Gated(Rc<RefCell<Vec<u64>>>);

impl System for Gated {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn run(&mut self, _: &mut World, _: &mut DerivedCaches, ctx: &TickContext<'_>) -> SimResult<()> {
        self.0.borrow_mut().push(ctx.frame);
        Ok(())
    }
}

fn small_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.tables.units = 4;
    config.tables.buildings = 4;
    config.grid.width = 8;
    config.grid.height = 8;
    config.grid.sector_size = 4;
    config
}

fn observed(interval: u32, offset: u32, start: u64, frames: u64) -> Vec<u64> {
    let ran = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulation::new(&small_config()).unwrap();
    sim.add_system(Gated(Rc::clone(&ran)), Schedule::new(interval, offset))
        .unwrap();
    sim.set_frame(start);
    for _ in 0..frames {
        sim.tick(1, &NoInput).unwrap();
    }
    let frames = ran.borrow().clone();
    frames
}

fn expected(interval: u32, offset: u32, start: u64, frames: u64) -> Vec<u64> {
    (start..start + frames)
        .filter(|&f| {
            let diff = i128::from(f) - i128::from(offset);
            diff.rem_euclid(i128::from(interval)) == 0
        })
        .collect()
}

const PAIRS: [(u32, u32); 7] = [(1, 0), (1, 5), (2, 0), (2, 1), (3, 2), (5, 7), (60, 13)];

/// Test: gating over 3*I consecutive frames from frame 0.
#[test]
fn test_gating_from_zero() {
    for (interval, offset) in PAIRS {
        let frames = 3 * u64::from(interval);
        assert_eq!(
            observed(interval, offset, 0, frames),
            expected(interval, offset, 0, frames),
            "I={interval} O={offset}"
        );
    }
}

/// Test: gating after the orchestrator realigns the frame counter.
#[test]
fn test_gating_after_set_frame() {
    for (interval, offset) in PAIRS {
        let frames = 3 * u64::from(interval);
        assert_eq!(
            observed(interval, offset, 1_000_003, frames),
            expected(interval, offset, 1_000_003, frames),
            "I={interval} O={offset}"
        );
    }
}

/// Test: every 3*I window contains exactly three runs.
#[test]
fn test_three_runs_per_window() {
    for (interval, offset) in PAIRS {
        for start in [0, 7, 100] {
            let runs = observed(interval, offset, start, 3 * u64::from(interval));
            assert_eq!(runs.len(), 3, "I={interval} O={offset} start={start}");
        }
    }
}
