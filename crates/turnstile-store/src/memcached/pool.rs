//! Connection reservation pool
//!
//! A fixed number of slots is guarded by a semaphore. Reserving a slot hands
//! out an idle connection or dials a new one; dropping the reservation puts
//! the connection back unless it broke while in use.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, warn};

use turnstile_common::{Result, TurnstileError};

use super::connection::MemcachedConnection;

/// Default number of connections kept per pool
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default time allowed to establish a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

pub struct ClientPool {
    address: String,
    connect_timeout: Duration,
    idle: Mutex<Vec<MemcachedConnection>>,
    permits: Semaphore,
    size: usize,
}

impl ClientPool {
    pub fn new(address: impl Into<String>, size: usize, connect_timeout: Duration) -> Self {
        let size = size.max(1);
        Self {
            address: address.into(),
            connect_timeout,
            idle: Mutex::new(Vec::with_capacity(size)),
            permits: Semaphore::new(size),
            size,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of open connections waiting to be reserved
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Reserve a connection, waiting for a free slot when all are in use
    pub async fn reserve(&self) -> Result<PooledConnection<'_>> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TurnstileError::PoolClosed)?;

        let idle = self.idle.lock().pop();
        let conn = match idle {
            Some(conn) => conn,
            None => {
                debug!(address = %self.address, "Opening memcached connection");
                MemcachedConnection::connect(&self.address, self.connect_timeout).await?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
            _permit: permit,
        })
    }

    /// Refuse further reservations and drop idle connections
    pub fn close(&self) {
        self.permits.close();
        self.idle.lock().clear();
    }

    fn give_back(&self, conn: MemcachedConnection) {
        if conn.is_broken() {
            warn!(address = %self.address, "Discarding broken memcached connection");
            return;
        }
        if !self.permits.is_closed() {
            self.idle.lock().push(conn);
        }
    }
}

/// A reserved connection, returned to its pool on drop
pub struct PooledConnection<'a> {
    conn: Option<MemcachedConnection>,
    pool: &'a ClientPool,
    _permit: SemaphorePermit<'a>,
}

impl Deref for PooledConnection<'_> {
    type Target = MemcachedConnection;

    fn deref(&self) -> &Self::Target {
        // Only taken in drop
        self.conn.as_ref().unwrap()
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().unwrap()
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.give_back(conn);
        }
    }
}
