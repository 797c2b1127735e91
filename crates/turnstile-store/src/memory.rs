//! In-memory counter store
//!
//! Keeps every key in a `DashMap`. Per-key atomicity comes from the shard
//! lock held while an entry is read and rewritten. Expiry is measured with
//! `tokio::time::Instant`, so tests running under paused time can let keys
//! lapse with `tokio::time::advance`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use turnstile_common::{CounterStore, Result, TurnstileError};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Counter store held entirely in process memory
///
/// Clones share the same entries, so one store can be handed to many lock
/// handles standing in for independent processes.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys that have not expired
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, key: &str, op: impl FnOnce(u64) -> u64) -> Result<u64> {
        let now = Instant::now();
        let mut entry = match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => entry,
            Some(entry) => {
                drop(entry);
                self.entries.remove_if(key, |_, e| e.is_expired(now));
                return Err(TurnstileError::KeyNotFound(key.to_string()));
            }
            None => return Err(TurnstileError::KeyNotFound(key.to_string())),
        };

        let current = entry
            .value
            .trim()
            .parse::<u64>()
            .map_err(|_| TurnstileError::NotANumber {
                key: key.to_string(),
                value: entry.value.clone(),
            })?;
        let next = op(current);
        // Counter updates keep the key's original expiry
        entry.value = next.to_string();
        Ok(next)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(entry) => {
                drop(entry);
                self.entries.remove_if(key, |_, e| e.is_expired(now));
                trace!(key = %key, "Expired key dropped on read");
                None
            }
            None => None,
        };
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<u64> {
        self.update(key, |n| n.wrapping_add(1))
    }

    async fn decrement(&self, key: &str) -> Result<u64> {
        self.update(key, |n| n.saturating_sub(1))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }
}
