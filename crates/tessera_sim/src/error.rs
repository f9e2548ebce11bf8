//! # Simulation Error Types
//!
//! Every variant here is fatal for the current frame. Stale handles and
//! repeated releases are not errors and never reach this type.

use thiserror::Error;

use tessera_core::CoreError;

/// Errors raised by the simulation substrate.
#[derive(Error, Debug)]
pub enum SimError {
    /// A table operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A system returned an error; the frame was abandoned.
    #[error("system `{system}` failed on frame {frame}")]
    SystemFailed {
        /// Name of the failing system.
        system: &'static str,
        /// Frame being simulated.
        frame: u64,
        /// The underlying failure.
        #[source]
        source: Box<SimError>,
    },

    /// A previous frame aborted; the pipeline must be reset first.
    #[error("pipeline faulted on frame {frame}; reset required")]
    PipelineFaulted {
        /// Frame on which the fault happened.
        frame: u64,
    },

    /// Systems may only be registered before the first frame after a reset,
    /// so every recorded hash array has the same shape.
    #[error("systems cannot be registered after frame {frame} has run; reset first")]
    RegistrationAfterStart {
        /// Next frame the pipeline would have executed.
        frame: u64,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`SimConfig`](crate::SimConfig).
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
