//! Lock handle: ticket acquisition, release and administrative calls

use std::sync::Arc;

use tracing::{debug, info, warn};

use turnstile_common::{CounterStore, LockKeys, LockValue, Result, TurnstileError};

use super::model::{LockOptions, RecordSnapshot};
use super::record::LockRecord;
use crate::metrics;

/// Handle on a named ticket lock
///
/// ```ignore
/// let lock = LockHandle::create("orders", store, LockOptions::default()).await?;
/// if lock.acquire(true).await? {
///     // protected work
/// }
/// lock.release().await?;
/// ```
///
/// A non-blocking `acquire` that returns `false` still holds a ticket and a
/// participant registration; the caller must `release` to balance them.
pub struct LockHandle {
    pub(super) record: LockRecord,
    pub(super) options: LockOptions,
}

impl LockHandle {
    /// Create a handle and seed a fresh record, resetting any existing one
    pub async fn create(
        name: impl Into<String>,
        store: Arc<dyn CounterStore>,
        options: LockOptions,
    ) -> Result<Self> {
        let handle = Self::open(name, store, options);
        handle.record.seed(options.timeout).await?;
        debug!(lock = %handle.name(), timeout = ?options.timeout, "Lock record created");
        Ok(handle)
    }

    /// Attach to a record without writing to the store
    pub fn open(name: impl Into<String>, store: Arc<dyn CounterStore>, options: LockOptions) -> Self {
        Self {
            record: LockRecord::new(name, store),
            options,
        }
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn keys(&self) -> &LockKeys {
        self.record.keys()
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Take a ticket and wait for it to be served
    ///
    /// Returns `Ok(false)` only when `blocking` is false and the ticket is not
    /// being served on the first poll. Fails with `LockExpired` when the
    /// serving key disappears and `LockClosed` when the lock is retired.
    pub async fn acquire(&self, blocking: bool) -> Result<bool> {
        let ticket = self.record.register().await?;
        debug!(lock = %self.name(), ticket, "Registered for lock");

        let served = self.wait_for_turn(ticket, blocking).await;
        metrics::record_acquire(&served);
        Ok(served?.is_some())
    }

    /// Admit the next ticket and drop this caller's registration
    pub async fn release(&self) -> Result<()> {
        let serving = self.record.advance().await?;
        let participants = self.record.unregister().await?;
        metrics::record_release();
        debug!(lock = %self.name(), serving, participants, "Lock released");
        Ok(())
    }

    /// Ask every waiter to rebuild the record on its next poll
    pub async fn initialize(&self) -> Result<()> {
        self.record.set_serving(LockValue::Init, None).await?;
        info!(lock = %self.name(), "Lock reinitialization requested");
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<RecordSnapshot> {
        self.record.snapshot().await
    }

    /// Poll the serving slot until `ticket` is served
    ///
    /// Returns the ticket that was served, which differs from the one passed
    /// in when a reinitialization issued a new one.
    pub(crate) async fn wait_for_turn(&self, mut ticket: u64, blocking: bool) -> Result<Option<u64>> {
        loop {
            let serving = self.record.serving().await?;
            debug!(lock = %self.name(), ticket, serving = ?serving, "Polled lock");

            match serving {
                None => {
                    warn!(lock = %self.name(), ticket, "Lock record expired while waiting");
                    return Err(TurnstileError::LockExpired {
                        name: self.name().to_string(),
                    });
                }
                Some(LockValue::Closed) => {
                    return Err(TurnstileError::LockClosed {
                        name: self.name().to_string(),
                    });
                }
                // The marker just read never equals a ticket, so the new
                // ticket is checked on the next poll
                Some(LockValue::Init) => ticket = self.reinitialize().await?,
                Some(value) if value.is_serving(ticket) => return Ok(Some(ticket)),
                Some(LockValue::Serving(_)) => {}
            }

            if !blocking {
                return Ok(None);
            }
            tokio::time::sleep(self.options.retry_interval).await;
        }
    }
}
