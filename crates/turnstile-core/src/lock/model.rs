//! Lock options and diagnostics model

use std::time::Duration;

use serde::{Deserialize, Serialize};

use turnstile_common::{DEFAULT_LOCK_TIMEOUT, DEFAULT_RETRY_INTERVAL, LockValue};

/// Per-handle settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Expiry applied to the record's keys when they are (re)seeded
    pub timeout: Duration,
    /// Sleep between two polls of a counter
    pub retry_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCK_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl LockOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }
}

/// Point-in-time read of the four counters of a lock
///
/// The four reads are not taken atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    pub name: String,
    /// `lock:N`
    pub serving: Option<LockValue>,
    /// `N-wait`
    pub last_ticket: Option<u64>,
    /// `N-event`
    pub participants: Option<u64>,
    /// `N-event_wait`
    pub acknowledgments: Option<u64>,
}

impl RecordSnapshot {
    /// Whether every key of the record is absent
    pub fn is_absent(&self) -> bool {
        self.serving.is_none()
            && self.last_ticket.is_none()
            && self.participants.is_none()
            && self.acknowledgments.is_none()
    }
}
