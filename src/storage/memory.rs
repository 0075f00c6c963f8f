//! In-memory session storage implementation

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use bon::Builder;
use retainer::Cache;
use tokio::{
    select, spawn,
    sync::{oneshot, Mutex as AsyncMutex},
};

use crate::error::SessionResult;

use super::interface::{JsonSerializer, RecordSerializer, SessionRecord, SessionStore};

/// Retention applied to sessions whose cookie has no expiration (one day)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest retention the cache will hold an entry for (about 100 years). Longer
/// time-to-live values are clamped to this.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/**
In-memory store for sessions. This is designed mostly for local development and
testing, and not for production use: sessions are lost on restart and aren't shared
between processes. It uses the [retainer] crate to create an async expiring cache.

Records are serialized before they are cached (JSON by default), so the stored
value never shares identity with the caller's objects.

# Example
```
use std::time::Duration;
use signed_session::storage::memory::MemoryStore;

// Create with default options
let default_store = MemoryStore::default();

// Or customize the key prefix and default retention
let custom_store = MemoryStore::builder()
    .prefix("sess:")
    .default_ttl(Duration::from_secs(60 * 60))
    .build();
```
*/
#[derive(Builder)]
pub struct MemoryStore {
    /// Prefix added to every session ID to form the cache key (default: none)
    #[builder(default, into)]
    prefix: String,
    /// Retention for sessions saved without a TTL (default: one day)
    #[builder(default = DEFAULT_TTL)]
    default_ttl: Duration,
    /// Serializer for stored records (default: JSON)
    #[builder(default = Arc::new(JsonSerializer), with = |serializer: impl RecordSerializer + 'static| Arc::new(serializer))]
    serializer: Arc<dyn RecordSerializer>,
    #[builder(skip)]
    cache: Arc<Cache<String, String>>,
    /// Serializes writes, so a `touch` never races a `set` or `destroy` of the same key
    #[builder(skip)]
    write_lock: AsyncMutex<()>,
    #[builder(skip)]
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MemoryStore {
    /// Number of unexpired sessions in the store
    pub async fn len(&self) -> usize {
        self.cache.unexpired().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Retention for an entry, clamped so the cache can always compute its expiry instant
    fn retention(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or(self.default_ttl).min(MAX_TTL)
    }

    fn shutdown_lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.shutdown_tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>> {
        let raw = match self.cache.get(&self.key(id)).await {
            Some(entry) => entry.value().to_owned(),
            None => return Ok(None),
        };
        self.serializer.deserialize(&raw).map(Some)
    }

    async fn set(
        &self,
        id: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> SessionResult<()> {
        let serialized = self.serializer.serialize(record)?;
        let _guard = self.write_lock.lock().await;
        self.cache
            .insert(self.key(id), serialized, self.retention(ttl))
            .await;
        Ok(())
    }

    async fn destroy(&self, id: &str) -> SessionResult<()> {
        let _guard = self.write_lock.lock().await;
        self.cache.remove(&self.key(id)).await;
        Ok(())
    }

    async fn touch(&self, id: &str, ttl: Duration) -> SessionResult<()> {
        let key = self.key(id);
        let _guard = self.write_lock.lock().await;
        let raw = match self.cache.get(&key).await {
            Some(entry) => entry.value().to_owned(),
            None => {
                log::debug!("Session '{id}' not found while refreshing its TTL");
                return Ok(());
            }
        };
        self.cache.insert(key, raw, self.retention(Some(ttl))).await;
        Ok(())
    }

    async fn setup(&self) -> SessionResult<()> {
        let cache = self.cache.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        spawn(async move {
            select! {
                _ = cache.monitor(10, 0.25, Duration::from_secs(5 * 60)) => (),
                _ = shutdown_rx => {
                    log::debug!("Session cache monitor shutdown");
                }
            }
        });
        if let Some(previous) = self.shutdown_lock().replace(shutdown_tx) {
            let _ = previous.send(());
        }
        Ok(())
    }

    async fn shutdown(&self) -> SessionResult<()> {
        if let Some(tx) = self.shutdown_lock().take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}
