//! Shared counter store contract
//!
//! A lock's entire state lives behind this trait. Every operation must be
//! atomic with respect to every other operation issued by any client of the
//! same backend. Values are carried as the raw strings the backend stores;
//! integer parsing and sentinel decoding happen in the lock record layer.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Key-value backend with atomic counters and per-key expiry
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a key. Returns `None` once the key is deleted or its TTL elapsed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally write a key. `ttl = None` means the key never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Atomically add one and return the new value.
    ///
    /// Fails with `KeyNotFound` for an absent key and `NotANumber` when the
    /// stored value is not a decimal integer.
    async fn increment(&self, key: &str) -> Result<u64>;

    /// Atomically subtract one and return the new value, saturating at zero.
    async fn decrement(&self, key: &str) -> Result<u64>;

    /// Remove a key. Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}
