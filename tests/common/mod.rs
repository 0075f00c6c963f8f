#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use signed_session::{
    error::{SessionError, SessionResult},
    storage::{memory::MemoryStore, SessionRecord, SessionStore},
    CookiePolicy, ResponsePolicy, SessionCookies,
};

/// A cookie write made by the session
#[derive(Clone, Debug, PartialEq)]
pub enum CookieWrite {
    Set {
        name: String,
        value: String,
        policy: CookiePolicy,
    },
    Delete {
        name: String,
        path: String,
    },
}

/// Cookie jar with fixed request cookies that records all response cookie writes
#[derive(Default)]
pub struct MockCookies {
    request: HashMap<String, String>,
    writes: Mutex<Vec<CookieWrite>>,
}

impl MockCookies {
    pub fn with_cookie(name: &str, value: &str) -> Self {
        Self {
            request: HashMap::from([(name.to_owned(), value.to_owned())]),
            writes: Mutex::default(),
        }
    }

    pub fn writes(&self) -> Vec<CookieWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Value of the last cookie set with this name
    pub fn last_set(&self, name: &str) -> Option<(String, CookiePolicy)> {
        self.writes().into_iter().rev().find_map(|write| match write {
            CookieWrite::Set {
                name: n,
                value,
                policy,
            } if n == name => Some((value, policy)),
            _ => None,
        })
    }
}

impl SessionCookies for MockCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.request.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, policy: &ResponsePolicy) {
        self.writes.lock().unwrap().push(CookieWrite::Set {
            name: name.to_owned(),
            value: policy.encode_value(value),
            policy: policy.policy().clone(),
        });
    }

    fn delete(&self, name: &str, policy: &ResponsePolicy) {
        self.writes.lock().unwrap().push(CookieWrite::Delete {
            name: name.to_owned(),
            path: policy.policy().path.clone(),
        });
    }
}

/// A store operation made by the session
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    Get(String),
    Set(String, Option<Duration>),
    Destroy(String),
    Touch(String, Duration),
}

/// Memory store that records every call made to it. Clones share the same state.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: Arc<MemoryStore>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl RecordingStore {
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, StoreCall::Get(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Read a record directly, without recording the call
    pub async fn peek(&self, id: &str) -> Option<SessionRecord> {
        self.inner.get(id).await.unwrap()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl SessionStore for RecordingStore {
    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>> {
        self.record(StoreCall::Get(id.to_owned()));
        self.inner.get(id).await
    }

    async fn set(
        &self,
        id: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> SessionResult<()> {
        self.record(StoreCall::Set(id.to_owned(), ttl));
        self.inner.set(id, record, ttl).await
    }

    async fn destroy(&self, id: &str) -> SessionResult<()> {
        self.record(StoreCall::Destroy(id.to_owned()));
        self.inner.destroy(id).await
    }

    async fn touch(&self, id: &str, ttl: Duration) -> SessionResult<()> {
        self.record(StoreCall::Touch(id.to_owned(), ttl));
        self.inner.touch(id, ttl).await
    }
}

/// A store operation that can be made to fail
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StoreOp {
    Get,
    Set,
    Destroy,
    Touch,
}

/// Memory store where selected operations return a backend error. Clones share the same state.
#[derive(Clone, Default)]
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    failing: Arc<Mutex<Vec<StoreOp>>>,
}

impl FailingStore {
    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().unwrap().push(op);
    }

    fn check(&self, op: StoreOp) -> SessionResult<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(SessionError::Backend("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FailingStore {
    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>> {
        self.check(StoreOp::Get)?;
        self.inner.get(id).await
    }

    async fn set(
        &self,
        id: &str,
        record: &SessionRecord,
        ttl: Option<Duration>,
    ) -> SessionResult<()> {
        self.check(StoreOp::Set)?;
        self.inner.set(id, record, ttl).await
    }

    async fn destroy(&self, id: &str) -> SessionResult<()> {
        self.check(StoreOp::Destroy)?;
        self.inner.destroy(id).await
    }

    async fn touch(&self, id: &str, ttl: Duration) -> SessionResult<()> {
        self.check(StoreOp::Touch)?;
        self.inner.touch(id, ttl).await
    }
}
