//! Turnstile Store - counter store backends
//!
//! This crate provides:
//! - `MemoryCounterStore`: in-process store with per-key expiry
//! - `MemcachedStore`: memcached text protocol client behind a reservation pool

pub mod memcached;
pub mod memory;

pub use memcached::{ClientPool, MemcachedStore, PooledConnection};
pub use memory::MemoryCounterStore;
