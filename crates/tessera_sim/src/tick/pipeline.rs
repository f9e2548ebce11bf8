//! The [`Simulation`] driver: owns the world, derived caches, registered
//! systems and diagnostics, and runs one frame per [`Simulation::tick`].

use std::time::{SystemTime, UNIX_EPOCH};

use super::{InputSource, Schedule, System, TickContext};
use crate::config::SimConfig;
use crate::derived::DerivedCaches;
use crate::diagnostics::{self, DesyncRecorder};
use crate::error::{SimError, SimResult};
use crate::world::{TableHashes, World};

/// Where the pipeline is within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPhase {
    /// Between frames.
    Idle,
    /// Clearing transient counters.
    BeginFrame,
    /// Rebuilding eager derived caches.
    RebuildDerived,
    /// Running registered systems.
    RunSystems,
    /// Recording diagnostics and advancing the frame counter.
    EndFrame,
    /// A frame aborted; reset or restore required.
    Faulted,
}

/// Outcome of one executed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame that was executed.
    pub frame: u64,
    /// Systems whose schedule matched.
    pub systems_run: u32,
    /// Systems skipped by interval gating.
    pub systems_skipped: u32,
    /// Eager derived caches that did work.
    pub caches_rebuilt: usize,
}

/// Isolated copy of authoritative state at a frame boundary.
#[derive(Clone, Debug)]
pub struct WorldSnapshot {
    /// Tables at the boundary.
    pub world: World,
    /// Next frame to execute.
    pub frame: u64,
    /// Session seed in effect.
    pub session_seed: u64,
}

struct ScheduledSystem {
    system: Box<dyn System>,
    schedule: Schedule,
}

/// Deterministic, rollback-capable simulation driver.
pub struct Simulation {
    world: World,
    derived: DerivedCaches,
    systems: Vec<ScheduledSystem>,
    names: Vec<&'static str>,
    /// Next frame to execute.
    frame: u64,
    session_seed: u64,
    phase: TickPhase,
    /// A frame has executed since the last reset.
    started: bool,
    diagnostics: DesyncRecorder,
    /// Hash array of the frame being recorded; reused across frames.
    scratch: Vec<u64>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("phase", &self.phase)
            .field("session_seed", &self.session_seed)
            .field("systems", &self.names)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with no systems and session seed 0.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            world: World::new(config),
            derived: DerivedCaches::new(config),
            systems: Vec::new(),
            names: Vec::new(),
            frame: 0,
            session_seed: 0,
            phase: TickPhase::Idle,
            started: false,
            diagnostics: DesyncRecorder::new(config.diagnostics.history_window),
            scratch: Vec::with_capacity(1),
        })
    }

    /// Creates a simulation with the reference gameplay systems registered.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `config` fails validation.
    pub fn with_reference_systems(config: &SimConfig) -> SimResult<Self> {
        let mut sim = Self::new(config)?;
        crate::systems::register_reference_systems(&mut sim, config)?;
        Ok(sim)
    }

    /// Appends a system; systems run in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::RegistrationAfterStart`] once a frame has run
    /// since the last reset, and [`SimError::InvalidConfig`] for a zero
    /// interval.
    pub fn add_system(
        &mut self,
        system: impl System + 'static,
        schedule: Schedule,
    ) -> SimResult<()> {
        if self.started {
            return Err(SimError::RegistrationAfterStart { frame: self.frame });
        }
        if schedule.interval == 0 {
            return Err(SimError::InvalidConfig(format!(
                "system `{}` has a zero interval",
                system.name()
            )));
        }
        tracing::debug!(
            system = system.name(),
            interval = schedule.interval,
            offset = schedule.offset,
            "Registered system"
        );
        self.names.push(system.name());
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            schedule,
        });

        let hashes_per_frame = self.names.len() + 1;
        self.scratch.reserve(hashes_per_frame.saturating_sub(self.scratch.len()));
        self.diagnostics.reserve(hashes_per_frame);
        Ok(())
    }

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PipelineFaulted`] if an earlier frame aborted,
    /// or [`SimError::SystemFailed`] if a system fails on this frame.
    pub fn tick(&mut self, player_count: u8, inputs: &dyn InputSource) -> SimResult<FrameReport> {
        self.execute_frame(player_count, inputs, false)
    }

    /// Runs one frame and records its per-system hash array.
    ///
    /// The array is available afterwards through
    /// [`system_hashes`](Self::system_hashes).
    ///
    /// # Errors
    ///
    /// Same as [`tick`](Self::tick).
    pub fn tick_with_hashes(
        &mut self,
        player_count: u8,
        inputs: &dyn InputSource,
    ) -> SimResult<FrameReport> {
        self.execute_frame(player_count, inputs, true)
    }

    fn execute_frame(
        &mut self,
        player_count: u8,
        inputs: &dyn InputSource,
        record: bool,
    ) -> SimResult<FrameReport> {
        let frame = self.frame;
        if self.phase == TickPhase::Faulted {
            return Err(SimError::PipelineFaulted { frame });
        }
        self.started = true;

        self.phase = TickPhase::BeginFrame;
        self.world.begin_frame();
        let mut hashes = std::mem::take(&mut self.scratch);
        hashes.clear();
        if record {
            hashes.push(self.world.compute_state_hash());
        }

        self.phase = TickPhase::RebuildDerived;
        let caches_rebuilt = self.derived.rebuild_all(&self.world);

        self.phase = TickPhase::RunSystems;
        let ctx = TickContext {
            frame,
            player_count,
            session_seed: self.session_seed,
            inputs,
        };
        let mut report = FrameReport {
            frame,
            caches_rebuilt,
            ..FrameReport::default()
        };

        for entry in &mut self.systems {
            if !entry.schedule.runs_on(frame) {
                report.systems_skipped += 1;
                if record {
                    let unchanged = hashes.last().copied().unwrap_or_default();
                    hashes.push(unchanged);
                }
                continue;
            }

            let name = entry.system.name();
            tracing::trace!(system = name, frame, "Running system");
            if let Err(source) = entry.system.run(&mut self.world, &mut self.derived, &ctx) {
                self.phase = TickPhase::Faulted;
                self.scratch = hashes;
                tracing::error!(system = name, frame, error = %source, "System failed, frame aborted");
                return Err(SimError::SystemFailed {
                    system: name,
                    frame,
                    source: Box::new(source),
                });
            }
            report.systems_run += 1;
            if record {
                let hash = self.world.compute_state_hash();
                tracing::trace!(system = name, frame, hash, "Hashed after system");
                hashes.push(hash);
            }
        }

        self.phase = TickPhase::EndFrame;
        if record {
            self.diagnostics.record(frame, &hashes);
        }
        self.scratch = hashes;
        self.frame = self.frame.wrapping_add(1);
        self.phase = TickPhase::Idle;
        Ok(report)
    }

    /// Aligns the frame counter; the next tick executes `frame`.
    pub fn set_frame(&mut self, frame: u64) {
        tracing::debug!(from = self.frame, to = frame, "Frame counter aligned");
        self.frame = frame;
    }

    /// Wipes the world for a new match.
    ///
    /// Adopts `session_seed` when given (multiplayer), otherwise derives
    /// one from the wall clock (single player). Also zeroes the frame
    /// counter, clears diagnostics and invalidates derived caches.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Core`] if a table fails its reset check; the
    /// pipeline is left `Faulted`.
    pub fn reset(&mut self, session_seed: Option<u64>) -> SimResult<()> {
        if let Err(err) = self.world.reset_all_tables() {
            self.phase = TickPhase::Faulted;
            tracing::error!(error = %err, "World reset left tables inconsistent");
            return Err(err.into());
        }
        self.session_seed = session_seed.unwrap_or_else(wall_clock_seed);
        self.frame = 0;
        self.started = false;
        self.phase = TickPhase::Idle;
        self.diagnostics.clear();
        self.derived.invalidate_all();
        tracing::debug!(
            session_seed = self.session_seed,
            supplied = session_seed.is_some(),
            "Simulation reset"
        );
        Ok(())
    }

    /// Marks every derived cache stale. Call after any external rollback.
    pub fn invalidate_derived(&mut self) {
        self.derived.invalidate_all();
    }

    /// Copies the authoritative state at the current frame boundary.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            world: self.world.clone(),
            frame: self.frame,
            session_seed: self.session_seed,
        }
    }

    /// Rolls back to `snapshot` and invalidates derived caches.
    ///
    /// Clears a `Faulted` phase. Diagnostics history is kept so replayed
    /// frames overwrite their earlier records.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) {
        self.world.clone_from(&snapshot.world);
        self.frame = snapshot.frame;
        self.session_seed = snapshot.session_seed;
        self.phase = TickPhase::Idle;
        self.derived.invalidate_all();
        tracing::debug!(frame = self.frame, "Restored snapshot");
    }

    /// Frames remaining before the match starts.
    #[inline]
    #[must_use]
    pub fn countdown_frames(&self) -> u32 {
        self.world.match_state().countdown_frames
    }

    /// Current hash of each table.
    #[must_use]
    pub fn table_hashes(&self) -> TableHashes {
        self.world.compute_per_table_hashes()
    }

    /// Current whole-world hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.world.compute_state_hash()
    }

    /// Per-system hash array recorded for `frame`, if still retained.
    ///
    /// Index 0 is the state after `begin_frame`; index `i` is the state
    /// after `system_names()[i - 1]`.
    #[must_use]
    pub fn system_hashes(&self, frame: u64) -> Option<&[u64]> {
        self.diagnostics.hashes(frame)
    }

    /// Label of hash index `index` in a recorded array.
    #[must_use]
    pub fn stage_label(&self, index: usize) -> Option<&'static str> {
        diagnostics::stage_label(&self.names, index)
    }

    /// Registered system names in execution order.
    #[inline]
    #[must_use]
    pub fn system_names(&self) -> &[&'static str] {
        &self.names
    }

    /// Authoritative tables.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Authoritative tables, mutably, for orchestrator-side edits between
    /// frames.
    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Derived caches as of the last frame.
    #[inline]
    #[must_use]
    pub fn derived(&self) -> &DerivedCaches {
        &self.derived
    }

    /// Derived caches, mutably, for lazy queries between frames.
    #[inline]
    pub fn derived_mut(&mut self) -> &mut DerivedCaches {
        &mut self.derived
    }

    /// Diagnostics history.
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &DesyncRecorder {
        &self.diagnostics
    }

    /// Current pipeline phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Next frame to execute.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Session seed in effect.
    #[inline]
    #[must_use]
    pub const fn session_seed(&self) -> u64 {
        self.session_seed
    }
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64)
}
