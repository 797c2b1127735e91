//! Memcached counter store
//!
//! Every operation reserves one pooled connection for the duration of a
//! single request/reply exchange. Atomicity of `incr`/`decr` is provided by
//! the memcached server itself.

mod connection;
mod pool;

#[cfg(test)]
mod fake_server;

pub use connection::MemcachedConnection;
pub use pool::{ClientPool, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POOL_SIZE, PooledConnection};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use turnstile_common::{CounterStore, Result};

/// Counter store backed by a memcached server
#[derive(Clone)]
pub struct MemcachedStore {
    pool: Arc<ClientPool>,
}

impl MemcachedStore {
    /// Create a store for `address` (`host:port`). Connections are opened lazily.
    pub fn new(address: impl Into<String>, pool_size: usize, connect_timeout: Duration) -> Self {
        let pool = ClientPool::new(address, pool_size, connect_timeout);
        info!(
            address = %pool.address(),
            pool_size = pool.size(),
            "MemcachedStore initialized"
        );
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn with_pool(pool: Arc<ClientPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<ClientPool> {
        &self.pool
    }
}

#[async_trait]
impl CounterStore for MemcachedStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.pool.reserve().await?.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.pool.reserve().await?.set(key, value, ttl).await
    }

    async fn increment(&self, key: &str) -> Result<u64> {
        self.pool.reserve().await?.increment(key).await
    }

    async fn decrement(&self, key: &str) -> Result<u64> {
        self.pool.reserve().await?.decrement(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.pool.reserve().await?.delete(key).await
    }
}
