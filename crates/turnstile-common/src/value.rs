//! Lock key naming and the "now serving" slot codec

use serde::{Deserialize, Serialize};

use crate::error::{Result, TurnstileError};
use crate::{
    CLOSE_MESSAGE, EVENT_KEY_SUFFIX, EVENT_WAIT_KEY_SUFFIX, INIT_MESSAGE, SERVING_KEY_PREFIX,
    WAIT_KEY_SUFFIX,
};

/// Content of the `lock:<name>` slot
///
/// The backend stores either a ticket number or one of two reserved markers
/// in the same key; this is the decoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockValue {
    /// Ticket currently allowed to hold the lock
    Serving(u64),
    /// A reinitialization was requested
    Init,
    /// The lock is retired
    Closed,
}

impl LockValue {
    /// Encode to the raw value written into the store
    pub fn encode(&self) -> String {
        match self {
            LockValue::Serving(ticket) => ticket.to_string(),
            LockValue::Init => INIT_MESSAGE.to_string(),
            LockValue::Closed => CLOSE_MESSAGE.to_string(),
        }
    }

    /// Decode a raw value read from `key`
    pub fn decode(key: &str, raw: &str) -> Result<Self> {
        match raw.trim() {
            INIT_MESSAGE => Ok(LockValue::Init),
            CLOSE_MESSAGE => Ok(LockValue::Closed),
            other => other
                .parse::<u64>()
                .map(LockValue::Serving)
                .map_err(|_| TurnstileError::NotANumber {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn is_serving(&self, ticket: u64) -> bool {
        *self == LockValue::Serving(ticket)
    }
}

impl std::fmt::Display for LockValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockValue::Serving(ticket) => write!(f, "{}", ticket),
            LockValue::Init => write!(f, "INIT"),
            LockValue::Closed => write!(f, "CLOSED"),
        }
    }
}

/// The four store keys that make up one lock record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockKeys {
    /// "Now serving" ticket or marker
    pub serving: String,
    /// Next ticket to hand out
    pub wait: String,
    /// Registered participant count
    pub event: String,
    /// Drain acknowledgment count
    pub event_wait: String,
}

impl LockKeys {
    pub fn new(name: &str) -> Self {
        Self {
            serving: format!("{}{}", SERVING_KEY_PREFIX, name),
            wait: format!("{}{}", name, WAIT_KEY_SUFFIX),
            event: format!("{}{}", name, EVENT_KEY_SUFFIX),
            event_wait: format!("{}{}", name, EVENT_WAIT_KEY_SUFFIX),
        }
    }

    /// All keys, in deletion order
    pub fn all(&self) -> [&str; 4] {
        [&self.serving, &self.wait, &self.event, &self.event_wait]
    }
}
