//! Close and reinitialize drains
//!
//! Both drains snapshot the participant count, check in once on the
//! acknowledgment counter and then poll it until it reaches the snapshot.
//! Only then is the record reset (reinitialize) or deleted (close).
//!
//! Nothing but the drain's own caller increments the acknowledgment counter,
//! so with more than one participant registered a drain keeps polling until
//! some other client checks in on `N-event_wait`.

use tracing::{debug, info};

use turnstile_common::{LockValue, Result};

use super::handle::LockHandle;
use crate::metrics;

impl LockHandle {
    /// Retire the lock for good
    ///
    /// Waiters observe `CLOSED` on their next poll and fail with
    /// `LockClosed`. The record's keys are deleted once the drain completes.
    pub async fn close(&self) -> Result<bool> {
        self.record.set_serving(LockValue::Closed, None).await?;

        let wait_client_count = self.record.participants().await?;
        let current_count = self.record.acknowledge().await?;
        info!(
            lock = %self.name(),
            wait_client_count = ?wait_client_count,
            current_count,
            "Closing lock"
        );

        if let Some(target) = wait_client_count.filter(|count| *count > 0) {
            self.await_acknowledgments(Some(target)).await?;
        }

        self.record.destroy().await?;
        metrics::record_close();
        info!(lock = %self.name(), "Lock closed");
        Ok(true)
    }

    /// Rebuild the record after observing `INIT`; returns the caller's new ticket
    pub(super) async fn reinitialize(&self) -> Result<u64> {
        let wait_client_count = self.record.participants().await?;
        let current_count = self.record.acknowledge().await?;

        self.record.reset_epoch(self.options.timeout).await?;
        info!(
            lock = %self.name(),
            wait_client_count = ?wait_client_count,
            current_count,
            "Reinitializing lock"
        );

        self.await_acknowledgments(wait_client_count).await?;
        self.record.reset_acknowledgments().await?;

        let ticket = self.record.next_ticket().await?;
        metrics::record_reinitialize();
        debug!(lock = %self.name(), ticket, "Rejoined lock in new epoch");
        Ok(ticket)
    }

    async fn await_acknowledgments(&self, target: Option<u64>) -> Result<()> {
        loop {
            let count = self.record.acknowledgments().await?;
            if count == target {
                return Ok(());
            }
            debug!(lock = %self.name(), count = ?count, target = ?target, "Waiting for drain");
            tokio::time::sleep(self.options.retry_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use turnstile_common::{CounterStore, TurnstileError};
    use turnstile_store::MemoryCounterStore;

    use super::*;
    use crate::lock::LockOptions;

    async fn create(store: &MemoryCounterStore) -> LockHandle {
        LockHandle::create("orders", Arc::new(store.clone()), LockOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_close_without_participants() {
        let store = MemoryCounterStore::new();
        let handle = create(&store).await;

        assert!(handle.close().await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_close_with_only_holder_registered() {
        let store = MemoryCounterStore::new();
        let handle = create(&store).await;
        assert!(handle.acquire(true).await.unwrap());

        // One participant; the close call's own check-in satisfies the drain
        assert!(handle.close().await.unwrap());
        assert!(handle.snapshot().await.unwrap().is_absent());

        let err = handle.release().await.unwrap_err();
        assert!(matches!(err, TurnstileError::KeyNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_waits_for_acknowledgments() {
        let store = MemoryCounterStore::new();
        let handle = Arc::new(create(&store).await);
        assert!(handle.acquire(true).await.unwrap());
        assert!(!handle.acquire(false).await.unwrap());

        let closer = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.close().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!closer.is_finished());
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.serving, Some(LockValue::Closed));
        assert_eq!(snapshot.participants, Some(2));
        assert_eq!(snapshot.acknowledgments, Some(1));

        store.increment("orders-event_wait").await.unwrap();

        assert!(closer.await.unwrap().unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_reinitialize_single_participant() {
        let store = MemoryCounterStore::new();
        let handle = create(&store).await;
        handle.record.register().await.unwrap();
        handle.record.set_serving(LockValue::Init, None).await.unwrap();

        let ticket = handle.reinitialize().await.unwrap();

        assert_eq!(ticket, 1);
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.serving, Some(LockValue::Serving(1)));
        assert_eq!(snapshot.last_ticket, Some(1));
        assert_eq!(snapshot.participants, Some(1));
        assert_eq!(snapshot.acknowledgments, Some(0));
    }
}
