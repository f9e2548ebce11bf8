//! # State Hashing
//!
//! Deterministic 64-bit hashing of replicated state.
//!
//! SipHash-1-3 with fixed zero keys gives the same output on every replica
//! and every run. Integers are written little-endian; `Pod` values are
//! written as their in-memory bytes, so replicas compared against each
//! other must share endianness.

use std::hash::Hasher;

use bytemuck::Pod;
use siphasher::sip::SipHasher13;

/// Incremental hasher for table layout and row content.
#[derive(Clone, Debug)]
pub struct StateHasher {
    inner: SipHasher13,
}

impl StateHasher {
    /// Creates a hasher with the fixed replica-wide keys.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SipHasher13::new_with_keys(0, 0),
        }
    }

    /// Writes one byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.inner.write(&[value]);
    }

    /// Writes a `u16` in little-endian order.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.inner.write(&value.to_le_bytes());
    }

    /// Writes a `u32` in little-endian order.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.inner.write(&value.to_le_bytes());
    }

    /// Writes a `u64` in little-endian order.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.inner.write(&value.to_le_bytes());
    }

    /// Writes the raw bytes of a plain-old-data value.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) {
        self.inner.write(bytemuck::bytes_of(value));
    }

    /// Returns the hash of everything written so far.
    #[inline]
    #[must_use]
    pub fn finish(&self) -> u64 {
        self.inner.finish()
    }
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}
