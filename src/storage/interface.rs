//! Shared interface for session storage

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{cookie::CookiePolicy, error::SessionResult};

/// Application-defined session data: an open mapping of field names to values.
/// An empty map is the initial state of every new session.
pub type SessionData = serde_json::Map<String, serde_json::Value>;

/// What gets written to and read from the store for each session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The cookie policy the session was issued with
    pub cookie: CookiePolicy,
    /// The session data
    pub data: SessionData,
}

/// Trait representing an expiring session store, keyed by session ID. You can use
/// your own store by implementing this trait.
///
/// Time-to-live values are passed as [`Duration`]s. A `ttl` of `None` means the
/// session's cookie has no expiration, and the store should apply its own default
/// retention.
///
/// Errors are passed through to the caller of the session operation as-is; the
/// session layer never retries. Timeouts are up to the store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session record. Should return `None` if the session was never stored, or
    /// if its time-to-live has elapsed (even if it hasn't been evicted yet).
    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>>;

    /// Insert or replace a session record.
    async fn set(
        &self,
        id: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> SessionResult<()>;

    /// Delete a session record. Deleting a missing session is not an error.
    async fn destroy(&self, id: &str) -> SessionResult<()>;

    /// Reset the time-to-live of a session record without rewriting it. Used by rolling sessions.
    async fn touch(&self, id: &str, ttl: Duration) -> SessionResult<()>;

    /// Optional setup of resources that will be called on server startup
    async fn setup(&self) -> SessionResult<()> {
        Ok(()) // Default no-op
    }

    /// Optional teardown of resources that will be called on server shutdown
    async fn shutdown(&self) -> SessionResult<()> {
        Ok(()) // Default no-op
    }
}

/// Converts session records to and from their stored string form.
pub trait RecordSerializer: Send + Sync {
    fn serialize(&self, record: &SessionRecord) -> SessionResult<String>;
    fn deserialize(&self, raw: &str) -> SessionResult<SessionRecord>;
}

/// JSON serialization via serde_json
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl RecordSerializer for JsonSerializer {
    fn serialize(&self, record: &SessionRecord) -> SessionResult<String> {
        Ok(serde_json::to_string(record)?)
    }

    fn deserialize(&self, raw: &str) -> SessionResult<SessionRecord> {
        Ok(serde_json::from_str(raw)?)
    }
}
