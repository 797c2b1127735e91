//! Turnstile Common - Shared types, traits, and constants
//!
//! This crate provides the foundational types used across all Turnstile components:
//! - Error types
//! - The `CounterStore` contract every backend implements
//! - Lock key naming and the encoding of the "now serving" slot
//! - Protocol constants

pub mod error;
pub mod store;
pub mod value;

// Re-exports for convenience
pub use error::{Result, TurnstileError};
pub use store::CounterStore;
pub use value::{LockKeys, LockValue};

use std::time::Duration;

/// Prefix of the "now serving" key (`lock:<name>`)
pub const SERVING_KEY_PREFIX: &str = "lock:";

/// Suffix of the next-ticket counter (`<name>-wait`)
pub const WAIT_KEY_SUFFIX: &str = "-wait";

/// Suffix of the registered-participant counter (`<name>-event`)
pub const EVENT_KEY_SUFFIX: &str = "-event";

/// Suffix of the drain acknowledgment counter (`<name>-event_wait`)
pub const EVENT_WAIT_KEY_SUFFIX: &str = "-event_wait";

/// Marker stored in the serving slot to request a reinitialization
pub const INIT_MESSAGE: &str = "M1";

/// Marker stored in the serving slot once the lock is retired
pub const CLOSE_MESSAGE: &str = "M2";

/// Interval between two polls of a shared counter
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Expiry applied to every key of a lock record
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// First ticket served in a fresh epoch
pub const FIRST_TICKET: u64 = 1;
