//! # Simulation Configuration
//!
//! Every tunable of the substrate is a plain value handed to constructors.
//! Values are loaded once at startup from TOML:
//!
//! ```toml
//! [tables]
//! units = 4096
//! buildings = 1024
//!
//! [grid]
//! width = 128
//! height = 128
//!
//! [systems.spawn_wave]
//! interval = 120
//! offset = 30
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::tick::Schedule;

/// Largest zone sector edge; keeps per-sector labels within `u16`.
pub const MAX_SECTOR_SIZE: u16 = 256;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Table capacities.
    pub tables: TableCapacities,
    /// Grid used by derived caches.
    pub grid: GridConfig,
    /// Desync diagnostics.
    pub diagnostics: DiagnosticsConfig,
    /// Match rules for the reference systems.
    pub rules: MatchRules,
    /// Schedules for the reference systems.
    pub systems: SystemSchedules,
}

/// Fixed row capacity of each table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableCapacities {
    /// Unit rows.
    pub units: u32,
    /// Building rows.
    pub buildings: u32,
}

impl Default for TableCapacities {
    fn default() -> Self {
        Self {
            units: 4096,
            buildings: 1024,
        }
    }
}

/// Grid dimensions and derived-cache parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
    /// Edge length of a zone graph sector in cells.
    pub sector_size: u16,
    /// Number of flow fields kept cached at once.
    pub flow_field_slots: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            sector_size: 16,
            flow_field_slots: 8,
        }
    }
}

impl GridConfig {
    /// Returns the number of cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Hash history kept for desync bisection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Number of frames retained before the oldest is evicted.
    pub history_window: u32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { history_window: 32 }
    }
}

/// Gameplay constants for the reference systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// Frames of pre-match countdown.
    pub countdown_frames: u32,
    /// Units spawned per player per wave.
    pub units_per_wave: u32,
    /// Health lost per attrition pass outside power coverage.
    pub attrition_damage: i32,
    /// Health regained per attrition pass inside power coverage.
    pub regeneration: i32,
    /// Frames a deactivated unit lingers before its row is released.
    pub release_after_frames: u32,
    /// Waves after which the match ends once no unit is active; 0 never ends.
    pub max_waves: u32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            countdown_frames: 180,
            units_per_wave: 4,
            attrition_damage: 5,
            regeneration: 1,
            release_after_frames: 30,
            max_waves: 0,
        }
    }
}

/// Schedule of each reference system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemSchedules {
    /// Match countdown.
    pub countdown: Schedule,
    /// Wave spawning.
    pub spawn_wave: Schedule,
    /// Unit movement.
    pub movement: Schedule,
    /// Power-dependent attrition.
    pub attrition: Schedule,
    /// Dead unit cleanup.
    pub cleanup: Schedule,
}

impl Default for SystemSchedules {
    fn default() -> Self {
        Self {
            countdown: Schedule::EVERY_FRAME,
            spawn_wave: Schedule::new(120, 0),
            movement: Schedule::new(2, 0),
            attrition: Schedule::new(10, 5),
            cleanup: Schedule::EVERY_FRAME,
        }
    }
}

impl SimConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// Missing sections and fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigParse`] or [`SimError::InvalidConfig`].
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigIo`] if the file cannot be read, or any
    /// error of [`SimConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every value against the substrate's limits.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: &str| -> SimResult<()> { Err(SimError::InvalidConfig(msg.to_string())) };

        if self.tables.units == 0 || self.tables.buildings == 0 {
            return invalid("table capacities must be greater than zero");
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            return invalid("grid dimensions must be greater than zero");
        }
        if self.grid.sector_size == 0 || self.grid.sector_size > MAX_SECTOR_SIZE {
            return invalid("zone sector size must be between 1 and 256");
        }
        if self.grid.flow_field_slots == 0 {
            return invalid("at least one flow field slot is required");
        }
        if self.diagnostics.history_window == 0 {
            return invalid("diagnostics history window must be greater than zero");
        }
        if self.rules.attrition_damage < 0 || self.rules.regeneration < 0 {
            return invalid("attrition damage and regeneration cannot be negative");
        }

        let schedules = [
            self.systems.countdown,
            self.systems.spawn_wave,
            self.systems.movement,
            self.systems.attrition,
            self.systems.cleanup,
        ];
        if schedules.iter().any(|s| s.interval == 0) {
            return invalid("system intervals must be at least 1");
        }
        Ok(())
    }
}
