//! Name-keyed cache of lock handles
//!
//! A reserved handle is taken out of the cache and put back when the
//! reservation drops, so concurrent reservations of one name never share a
//! handle object. They still share the record in the store.

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use turnstile_common::{CounterStore, Result};

use crate::lock::{LockHandle, LockOptions};

pub struct LockRegistry {
    store: Arc<dyn CounterStore>,
    options: LockOptions,
    handles: DashMap<String, LockHandle>,
}

impl LockRegistry {
    pub fn new(store: Arc<dyn CounterStore>, options: LockOptions) -> Self {
        Self {
            store,
            options,
            handles: DashMap::new(),
        }
    }

    /// Take the cached handle for `name`, creating the lock when none is cached
    pub async fn reserve(&self, name: &str) -> Result<ReservedLock<'_>> {
        let handle = match self.handles.remove(name) {
            Some((_, handle)) => handle,
            None => {
                debug!(lock = %name, "Creating lock handle");
                LockHandle::create(name, self.store.clone(), self.options).await?
            }
        };

        Ok(ReservedLock {
            registry: self,
            handle: Some(handle),
        })
    }

    /// Run `task` while holding the lock named `name`
    ///
    /// Returns `Ok(None)` when the lock was not acquired. The lock is released
    /// after the task completes, and also after an unsuccessful attempt so the
    /// participant count stays balanced. A handle whose lock turned out closed
    /// or expired is not cached again.
    pub async fn run_locked<F, T>(&self, name: &str, task: F) -> Result<Option<T>>
    where
        F: Future<Output = T>,
    {
        let lock = self.reserve(name).await?;

        let acquired = match lock.acquire(true).await {
            Ok(acquired) => acquired,
            Err(e) => {
                if e.is_lock_state() {
                    lock.discard();
                }
                return Err(e);
            }
        };

        let output = if acquired { Some(task.await) } else { None };
        lock.release().await?;

        Ok(output)
    }

    fn put_back(&self, handle: LockHandle) {
        self.handles.insert(handle.name().to_string(), handle);
    }
}

/// A handle checked out of a `LockRegistry`
pub struct ReservedLock<'a> {
    registry: &'a LockRegistry,
    handle: Option<LockHandle>,
}

impl ReservedLock<'_> {
    /// Drop the handle instead of returning it to the registry
    pub fn discard(mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(lock = %handle.name(), "Discarding lock handle");
        }
    }
}

impl Deref for ReservedLock<'_> {
    type Target = LockHandle;

    fn deref(&self) -> &Self::Target {
        // Only taken in drop
        self.handle.as_ref().unwrap()
    }
}

impl Drop for ReservedLock<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.registry.put_back(handle);
        }
    }
}
