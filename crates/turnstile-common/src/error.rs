//! Error types for Turnstile
//!
//! `LockExpired` and `LockClosed` are the two protocol failures raised from
//! `acquire`. Everything else originates in a store backend and is passed
//! through the protocol unchanged.

/// Turnstile error type
#[derive(thiserror::Error, Debug)]
pub enum TurnstileError {
    #[error("lock '{name}' timed out: serving key is absent")]
    LockExpired { name: String },

    #[error("lock '{name}' is closed")]
    LockClosed { name: String },

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("key '{key}' holds non-numeric value '{value}'")]
    NotANumber { key: String, value: String },

    #[error("store protocol error: {0}")]
    Protocol(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection pool is closed")]
    PoolClosed,
}

impl TurnstileError {
    /// Whether the error is one of the protocol's fatal lock states
    pub fn is_lock_state(&self) -> bool {
        matches!(
            self,
            TurnstileError::LockExpired { .. } | TurnstileError::LockClosed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TurnstileError>;
