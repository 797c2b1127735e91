//! Turnstile Core - ticket lock protocol
//!
//! This crate provides:
//! - `LockHandle`: FIFO ticket lock whose state lives in a `CounterStore`
//! - Close and reinitialize drains
//! - `LockRegistry`: name-keyed cache of handles and `run_locked`
//! - `Configuration`: file/environment backed settings
//! - Metric descriptions for lock operations

pub mod config;
pub mod lock;
pub mod metrics;
pub mod registry;

pub use crate::config::Configuration;
pub use lock::{LockHandle, LockOptions, LockRecord, RecordSnapshot};
pub use registry::{LockRegistry, ReservedLock};
