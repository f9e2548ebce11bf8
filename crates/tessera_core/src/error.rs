//! # Core Error Types
//!
//! Only fatal conditions are errors. Stale lookups and repeated releases
//! are ordinary outcomes during resimulation and resolve to `None`/`false`.

use thiserror::Error;

/// Errors raised by the table kernel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Every slot of a table is in use and no growth path exists.
    #[error("table `{table}` exhausted: all {capacity} slots are live")]
    CapacityExhausted {
        /// Table name.
        table: &'static str,
        /// Fixed capacity of the table.
        capacity: u32,
    },

    /// A table failed its consistency check after a reset.
    #[error("inconsistent reset of table `{table}`: {detail}")]
    InconsistentReset {
        /// Table name.
        table: &'static str,
        /// Which invariant was violated.
        detail: &'static str,
    },
}

/// Result type for kernel operations.
pub type CoreResult<T> = Result<T, CoreError>;
