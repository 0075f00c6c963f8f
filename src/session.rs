use std::{fmt::Display, time::Duration};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::SessionConfig,
    cookie::{RequestContext, ResponsePolicy},
    error::SessionResult,
    id::generate_session_id,
    signature::{sign, unsign},
    storage::{SessionData, SessionRecord, SessionStore},
};

/// Where the session's data came from, and whether it has been changed since
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// New session with a fresh ID and empty data
    Uninitialized,
    /// Session loaded from the store
    Restored,
    /// Data was replaced during this request
    Mutated,
}

/**
Represents the session of the current request.

A session is created by [`Session::initialize`], which either restores the session
named by a validly signed request cookie, or starts a new one with a fresh ID and
empty data. Changes are only written to the store when you call [`save`](Session::save)
(or right away from [`set_data`](Session::set_data) when `save_uninitialized` is on).

Sessions are independent per-request values: nothing is shared between concurrent
requests except the store.

# Example
```rust
use signed_session::{RequestContext, Session, SessionConfig, SessionCookies, ResponsePolicy};

struct NoCookies;
impl SessionCookies for NoCookies {
    fn get(&self, _name: &str) -> Option<String> { None }
    fn set(&self, _name: &str, _value: &str, _policy: &ResponsePolicy) {}
    fn delete(&self, _name: &str, _policy: &ResponsePolicy) {}
}

# tokio::runtime::Runtime::new().unwrap().block_on(async {
let config = SessionConfig::builder().secret("my-secret").build();
let mut session = Session::initialize(RequestContext::new(&NoCookies), &config).await?;
assert!(session.data().is_empty());

session.set_key("user_id", "123").await?;
session.save().await?;
# Ok::<(), signed_session::error::SessionError>(())
# }).unwrap();
```
*/
pub struct Session<'a> {
    id: String,
    cookie: ResponsePolicy,
    data: SessionData,
    /// Time-to-live handed to the store on save, derived from the cookie
    store_ttl: Option<Duration>,
    state: SessionState,
    request: RequestContext<'a>,
    config: &'a SessionConfig,
}

impl Display for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Session(id: {:?})", self.id)
    }
}

impl<'a> Session<'a> {
    /// New session with a fresh ID and empty data
    fn new(request: RequestContext<'a>, config: &'a SessionConfig) -> Self {
        let cookie = config.new_session_cookie(request.origin);
        let store_ttl = cookie.policy().store_ttl();
        Self {
            id: generate_session_id(),
            cookie,
            data: SessionData::new(),
            store_ttl,
            state: SessionState::Uninitialized,
            request,
            config,
        }
    }

    /// Load the session for a request.
    ///
    /// If the request has a validly signed session cookie and the store has the
    /// session, it is restored (and, for rolling sessions with a `max_age`, its store
    /// TTL and cookie are renewed). Otherwise a new session is returned, which is
    /// saved and sent as a cookie right away only if `save_uninitialized` is on.
    ///
    /// Invalid signatures are not errors: they just lead to a new session.
    /// Store errors are returned as-is.
    pub async fn initialize(
        request: RequestContext<'a>,
        config: &'a SessionConfig,
    ) -> SessionResult<Session<'a>> {
        let mut session = Session::new(request, config);

        let signed_id = request.cookies.get(&config.name);
        match signed_id.as_deref().and_then(|token| unsign(token, &config.secret)) {
            Some(id) => {
                log::debug!("Got session id '{id}' from cookie. Retrieving session...");
                if let Some(record) = config.store.get(&id).await? {
                    session.restore(id, record);
                    if config.rolling {
                        session.renew().await?;
                    }
                    return Ok(session);
                }
                log::debug!("Session '{id}' not found in store. Creating new session...");
            }
            None if signed_id.is_some() => {
                log::debug!("Session cookie failed verification. Creating new session...");
            }
            None => log::debug!("No session cookie found. Creating new session..."),
        }

        if config.save_uninitialized {
            log::debug!("Saving uninitialized session '{}'", session.id);
            session.write_record().await?;
            session.write_cookie();
        }
        Ok(session)
    }

    fn restore(&mut self, id: String, record: SessionRecord) {
        self.id = id;
        self.store_ttl = record.cookie.store_ttl();
        self.cookie = self.config.restored_session_cookie(record.cookie);
        self.data = record.data;
        self.state = SessionState::Restored;
    }

    /// Rolling renewal: reset the store TTL and re-send the cookie with its `max_age`
    async fn renew(&self) -> SessionResult<()> {
        let Some(ttl) = self.cookie.policy().max_age_ttl() else {
            return Ok(());
        };
        log::debug!("Renewing rolling session '{}'", self.id);
        self.config.store.touch(&self.id, ttl).await?;
        self.write_cookie();
        Ok(())
    }

    /// The session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name of the session cookie
    pub fn cookie_name(&self) -> &str {
        &self.config.name
    }

    /// The session cookie policy
    pub fn cookie(&self) -> &ResponsePolicy {
        &self.cookie
    }

    /// The session data
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// The configured session store
    pub fn store(&self) -> &dyn SessionStore {
        self.config.store.as_ref()
    }

    /// Time-to-live used when saving to the store. `None` means the store's default applies.
    pub fn store_ttl(&self) -> Option<Duration> {
        self.store_ttl
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the value of a key in the session data. Returns `None` if the key is
    /// missing or its value can't be deserialized as `T`.
    pub fn get_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
    }

    /// Replace the session data.
    ///
    /// With `save_uninitialized` on, the record is written to the store right away
    /// (without touching the cookie). Otherwise, call [`save`](Session::save) to persist it.
    pub async fn set_data(&mut self, data: SessionData) -> SessionResult<()> {
        self.data = data;
        self.state = SessionState::Mutated;
        if self.config.save_uninitialized {
            self.write_record().await?;
        }
        Ok(())
    }

    /// Set the value of a key in the session data. Same persistence rules as [`set_data`](Session::set_data).
    pub async fn set_key(
        &mut self,
        key: impl Into<String>,
        value: impl Serialize,
    ) -> SessionResult<()> {
        let mut data = self.data.clone();
        data.insert(key.into(), serde_json::to_value(value)?);
        self.set_data(data).await
    }

    /// Remove a key from the session data. Same persistence rules as [`set_data`](Session::set_data).
    pub async fn remove_key(&mut self, key: &str) -> SessionResult<()> {
        let mut data = self.data.clone();
        data.remove(key);
        self.set_data(data).await
    }

    /// Save the session to the store, then set the signed session cookie.
    ///
    /// The two writes aren't atomic: if the request is cancelled in between, the
    /// store may hold a record whose cookie never reached the client.
    pub async fn save(&self) -> SessionResult<()> {
        self.write_record().await?;
        self.write_cookie();
        Ok(())
    }

    /// Destroy this session, and start a new one with a fresh ID and empty data.
    /// The new session isn't saved until you save it.
    pub async fn regenerate(self) -> SessionResult<Session<'a>> {
        let (request, config) = (self.request, self.config);
        self.destroy().await?;
        Ok(Session::new(request, config))
    }

    /// Delete the session from the store and clear the session cookie.
    pub async fn destroy(self) -> SessionResult<()> {
        log::debug!("Destroying session '{}'", self.id);
        self.config.store.destroy(&self.id).await?;
        self.request.cookies.delete(&self.config.name, &self.cookie);
        Ok(())
    }

    async fn write_record(&self) -> SessionResult<()> {
        let record = SessionRecord {
            cookie: self.cookie.policy().clone(),
            data: self.data.clone(),
        };
        self.config.store.set(&self.id, &record, self.store_ttl).await
    }

    fn write_cookie(&self) {
        let token = sign(&self.id, &self.config.secret);
        self.request
            .cookies
            .set(&self.config.name, &token, &self.cookie);
    }
}
