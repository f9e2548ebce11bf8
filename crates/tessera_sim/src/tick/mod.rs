//! # Tick Pipeline
//!
//! ```text
//! Frame F:
//!   Idle
//!    └─ BeginFrame       clear transient counters, hash #0 when recording
//!    └─ RebuildDerived   eager caches, dependency order
//!    └─ RunSystems       registration order, interval gated, hash after each
//!    └─ EndFrame         store hash array, F += 1
//!   Idle
//! ```
//!
//! A failing system aborts the frame and leaves the pipeline `Faulted`;
//! nothing runs again until [`Simulation::reset`] or
//! [`Simulation::restore`].

mod context;
mod pipeline;
mod schedule;

pub use context::{InputSource, NoInput, PlayerInput, TickContext, BUTTON_RETARGET};
pub use pipeline::{FrameReport, Simulation, TickPhase, WorldSnapshot};
pub use schedule::Schedule;

use crate::derived::DerivedCaches;
use crate::error::SimResult;
use crate::world::World;

/// One gameplay step executed by the pipeline.
///
/// Systems must be deterministic functions of the world, the derived
/// caches and the [`TickContext`]. Anything they keep in `self` is not
/// snapshotted, so it must not influence simulation results.
pub trait System {
    /// Stable name used in hash labels and logs.
    fn name(&self) -> &'static str;

    /// Executes the system for `ctx.frame`.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole frame.
    fn run(
        &mut self,
        world: &mut World,
        derived: &mut DerivedCaches,
        ctx: &TickContext<'_>,
    ) -> SimResult<()>;
}
