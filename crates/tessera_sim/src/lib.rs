//! # TESSERA Simulation Substrate
//!
//! The deterministic, rollback-capable core of a lockstep game:
//! - [`world`] - the registry of authoritative tables and their hashes
//! - [`derived`] - caches recomputed from tables, never authoritative
//! - [`tick`] - the frame pipeline with interval-gated systems
//! - [`diagnostics`] - per-system hash history for desync bisection
//! - [`presentation`] - orphan reconciliation for an external view layer
//!
//! ## Architecture Rules
//!
//! 1. **Single threaded** - tables are mutated only by the pipeline, no locks
//! 2. **Integer only** - no floating point touches authoritative state
//! 3. **Explicit context** - frame, seed and inputs arrive in a
//!    [`TickContext`]; there are no ambient singletons
//! 4. **All or nothing frames** - a failing system faults the pipeline
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_sim::{NoInput, SimConfig, Simulation};
//!
//! let config = SimConfig::load("tessera.toml")?;
//! let mut sim = Simulation::with_reference_systems(&config)?;
//! sim.reset(Some(session_seed))?;
//!
//! loop {
//!     sim.tick(player_count, &NoInput)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod derived;
pub mod diagnostics;
pub mod error;
pub mod presentation;
pub mod systems;
pub mod tick;
pub mod world;

pub use config::SimConfig;
pub use derived::{DerivedCache, DerivedCaches};
pub use diagnostics::{first_divergence, DesyncRecorder};
pub use error::{SimError, SimResult};
pub use presentation::{PresentationSync, SyncReport, TaggedViews, ViewWorld};
pub use tick::{
    FrameReport, InputSource, NoInput, PlayerInput, Schedule, Simulation, System, TickContext,
    TickPhase, WorldSnapshot,
};
pub use world::{TableHashes, World};

pub use tessera_core::{Handle, Liveness, Slot, StableId, TableId};
