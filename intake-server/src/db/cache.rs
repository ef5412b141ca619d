//! Lazy connection cache
//!
//! One store handle per process, opened on first use and reused afterwards.
//! Concurrent first-time callers share a single connection attempt; a failed
//! attempt leaves the cache empty so the next call starts over.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::store::{Connector, ContactStore, StoreError};

/// Snapshot of the cache for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Connected,
    Disconnected,
}

/// Memoized store handle shared by all requests
pub struct ConnectionCache {
    connector: Arc<dyn Connector>,
    cached: RwLock<Option<Arc<dyn ContactStore>>>,
    /// Serializes connection attempts
    connecting: Mutex<()>,
    attempts: AtomicU64,
}

impl ConnectionCache {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            cached: RwLock::new(None),
            connecting: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the cached store, connecting first if needed.
    ///
    /// # Errors
    ///
    /// Returns the connector's error when no handle is cached and the
    /// connection attempt fails. The cache stays empty in that case.
    pub async fn get(&self) -> Result<Arc<dyn ContactStore>, StoreError> {
        if let Some(store) = self.current().await {
            tracing::debug!("reusing cached store connection");
            return Ok(store);
        }

        let _gate = self.connecting.lock().await;

        // Another caller may have connected while we waited
        if let Some(store) = self.current().await {
            return Ok(store);
        }

        self.attempts.fetch_add(1, Ordering::Relaxed);
        let target = self.connector.describe();
        tracing::info!(store = %target, "opening store connection");

        match self.connector.connect().await {
            Ok(store) => {
                *self.cached.write().await = Some(store.clone());
                tracing::info!(store = %target, "store connected");
                Ok(store)
            }
            Err(err) => {
                *self.cached.write().await = None;
                tracing::error!(store = %target, error = %err, "store connection failed");
                Err(err)
            }
        }
    }

    /// Cached store without connecting
    pub async fn current(&self) -> Option<Arc<dyn ContactStore>> {
        self.cached.read().await.clone()
    }

    pub async fn state(&self) -> CacheState {
        if self.cached.read().await.is_some() {
            CacheState::Connected
        } else {
            CacheState::Disconnected
        }
    }

    /// Drop `failed` from the cache so the next `get` reconnects.
    ///
    /// A handle cached by a newer connection is left alone.
    pub async fn reset(&self, failed: &Arc<dyn ContactStore>) {
        let mut cached = self.cached.write().await;
        if cached.as_ref().is_some_and(|current| Arc::ptr_eq(current, failed)) {
            *cached = None;
            tracing::warn!("store connection reset");
        }
    }

    /// Close and drop the cached handle (shutdown).
    pub async fn close(&self) {
        let store = self.cached.write().await.take();
        if let Some(store) = store {
            store.close().await;
            tracing::info!("store connection closed");
        }
    }

    /// Number of connection attempts made so far
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}
