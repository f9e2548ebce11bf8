//! # TESSERA Core Kernel
//!
//! Pooled, stable-identifier addressed storage for a deterministic
//! lockstep simulation:
//! - Fixed-capacity tables, all memory allocated at construction
//! - Slots recycle, identifiers never do
//! - Table layout is part of replicated state and is hashed with it
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot path** - allocate/free only move indices
//! 2. **Structure of arrays** - every row field lives in its own [`Column`]
//! 3. **Identical call history, identical layout** - the free list and the
//!    identifier counter are pure functions of the allocate/free sequence
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{SlotIndex, TableId};
//!
//! let mut index = SlotIndex::new(TableId(1), "units", 1024);
//! let (slot, id) = index.allocate()?;
//! assert_eq!(index.get_slot(id), Some(slot));
//! index.free(id);
//! assert_eq!(index.get_slot(id), None);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod hash;
pub mod table;

pub use error::{CoreError, CoreResult};
pub use hash::StateHasher;
pub use table::{
    Column, Handle, Liveness, SingletonTable, Slot, SlotIndex, StableId, Table, TableId,
};
