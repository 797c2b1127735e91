//! Typed access to the four counters of one lock

use std::sync::Arc;
use std::time::Duration;

use turnstile_common::{CounterStore, FIRST_TICKET, LockKeys, LockValue, Result, TurnstileError};

use super::model::RecordSnapshot;

/// Store adapter for a single lock record
///
/// Decodes the serving slot into a `LockValue` and the three counters into
/// integers. Holds no lock state of its own.
#[derive(Clone)]
pub struct LockRecord {
    name: String,
    keys: LockKeys,
    store: Arc<dyn CounterStore>,
}

impl LockRecord {
    pub fn new(name: impl Into<String>, store: Arc<dyn CounterStore>) -> Self {
        let name = name.into();
        let keys = LockKeys::new(&name);
        Self { name, keys, store }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &LockKeys {
        &self.keys
    }

    /// Write a fresh record: serving the first ticket, all counters zero
    pub async fn seed(&self, ttl: Duration) -> Result<()> {
        self.set_serving(LockValue::Serving(FIRST_TICKET), Some(ttl))
            .await?;
        self.store.set(&self.keys.wait, "0", Some(ttl)).await?;
        self.store.set(&self.keys.event, "0", Some(ttl)).await?;
        self.store.set(&self.keys.event_wait, "0", Some(ttl)).await
    }

    pub async fn serving(&self) -> Result<Option<LockValue>> {
        match self.store.get(&self.keys.serving).await? {
            Some(raw) => LockValue::decode(&self.keys.serving, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn set_serving(&self, value: LockValue, ttl: Option<Duration>) -> Result<()> {
        self.store
            .set(&self.keys.serving, &value.encode(), ttl)
            .await
    }

    /// Declare a participant and draw the next ticket
    pub async fn register(&self) -> Result<u64> {
        self.store.increment(&self.keys.event).await?;
        self.store.increment(&self.keys.wait).await
    }

    /// Admit the next ticket; returns the new serving value
    pub async fn advance(&self) -> Result<u64> {
        self.store.increment(&self.keys.serving).await
    }

    /// Drop a participant; returns the remaining count
    pub async fn unregister(&self) -> Result<u64> {
        self.store.decrement(&self.keys.event).await
    }

    pub async fn participants(&self) -> Result<Option<u64>> {
        self.counter(&self.keys.event).await
    }

    pub async fn acknowledgments(&self) -> Result<Option<u64>> {
        self.counter(&self.keys.event_wait).await
    }

    /// Check in at a drain barrier; returns the acknowledgment count
    pub async fn acknowledge(&self) -> Result<u64> {
        self.store.increment(&self.keys.event_wait).await
    }

    pub async fn reset_acknowledgments(&self) -> Result<()> {
        self.store.set(&self.keys.event_wait, "0", None).await
    }

    /// Start a new epoch: serve the first ticket and restart numbering
    pub async fn reset_epoch(&self, ttl: Duration) -> Result<()> {
        self.set_serving(LockValue::Serving(FIRST_TICKET), Some(ttl))
            .await?;
        self.store.set(&self.keys.wait, "0", Some(ttl)).await
    }

    /// Draw a ticket without registering as a participant
    pub async fn next_ticket(&self) -> Result<u64> {
        self.store.increment(&self.keys.wait).await
    }

    /// Delete every key of the record
    pub async fn destroy(&self) -> Result<()> {
        for key in self.keys.all() {
            self.store.delete(key).await?;
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<RecordSnapshot> {
        Ok(RecordSnapshot {
            name: self.name.clone(),
            serving: self.serving().await?,
            last_ticket: self.counter(&self.keys.wait).await?,
            participants: self.participants().await?,
            acknowledgments: self.acknowledgments().await?,
        })
    }

    async fn counter(&self, key: &str) -> Result<Option<u64>> {
        match self.store.get(key).await? {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| TurnstileError::NotANumber {
                    key: key.to_string(),
                    value: raw,
                }),
            None => Ok(None),
        }
    }
}
