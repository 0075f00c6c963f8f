use std::sync::Arc;

use bon::Builder;

use crate::{
    cookie::{CookieEncoder, CookiePolicy, RequestOrigin, ResponsePolicy},
    error::{SessionError, SessionResult},
    signature::Secret,
    storage::{memory::MemoryStore, SessionStore},
};

/// Default name of the session cookie
pub const DEFAULT_COOKIE_NAME: &str = "connect.sid";

/**
Session configuration, shared by every request.

# Example
```rust
use signed_session::{storage::memory::MemoryStore, Secret, SessionConfig};

// Only the secret is required
let config = SessionConfig::builder().secret("my-secret").build();

// Or customize the other settings
let custom = SessionConfig::builder()
    .secret(Secret::rotating(["new-secret", "old-secret"]).unwrap())
    .name("my_app.sid")
    .rolling(true)
    .with_cookie(|cookie| {
        cookie.path = "/app".to_owned();
        cookie.max_age = Some(7 * 24 * 60 * 60); // 7 days
    })
    .store(MemoryStore::builder().prefix("my_app:").build())
    .build();
```
*/
#[derive(Builder)]
pub struct SessionConfig {
    /// Secret(s) for signing and verifying session cookies. For signing, only the first
    /// secret is used; for verification, all secrets are tried in order.
    #[builder(into)]
    pub(crate) secret: Secret,
    /// The name of the session cookie (default: `"connect.sid"`). If you have multiple apps
    /// on the same hostname, give each of them a different name.
    #[builder(default = DEFAULT_COOKIE_NAME.to_owned(), into)]
    pub(crate) name: String,
    /// Set the cookie policy directly. Alternatively, use `with_cookie` to customize the
    /// default policy via a closure. Unset `http_only`, `same_site` and `secure` attributes
    /// are derived per request.
    #[builder(default)]
    pub(crate) cookie: CookiePolicy,
    /// Transform applied to the signed cookie value before it's set. It's never stored,
    /// so it's re-attached to restored sessions from here.
    #[builder(with = |encode: impl Fn(&str) -> String + Send + Sync + 'static| CookieEncoder::new(encode))]
    pub(crate) encoder: Option<CookieEncoder>,
    /// Reset the session's expiration on every request that loads an existing session.
    /// Only has an effect when the cookie has a `max_age`. (default: `false`)
    #[builder(default)]
    pub(crate) rolling: bool,
    /// Save new sessions to the store right away, even if they were never modified.
    /// Leaving this off avoids storing sessions for anonymous visitors, and avoids races
    /// between parallel requests from a client without a session. (default: `false`)
    #[builder(default)]
    pub(crate) save_uninitialized: bool,
    /// Set the session store. The default is an in-memory store.
    #[builder(default = Arc::new(MemoryStore::default()), with = |store: impl SessionStore + 'static| Arc::new(store))]
    pub(crate) store: Arc<dyn SessionStore>,
}

use session_config_builder::{IsUnset, SetCookie, State};
impl<S> SessionConfigBuilder<S>
where
    S: State,
{
    /// Customize the [cookie policy](CookiePolicy) via a closure. Any attributes that are
    /// not set will retain their default values.
    pub fn with_cookie<CookieFn>(self, cookie_fn: CookieFn) -> SessionConfigBuilder<SetCookie<S>>
    where
        S::Cookie: IsUnset,
        CookieFn: FnOnce(&mut CookiePolicy),
    {
        let mut cookie = CookiePolicy::default();
        cookie_fn(&mut cookie);
        self.cookie(cookie)
    }
}

impl SessionConfig {
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cookie(&self) -> &CookiePolicy {
        &self.cookie
    }

    pub fn rolling(&self) -> bool {
        self.rolling
    }

    pub fn save_uninitialized(&self) -> bool {
        self.save_uninitialized
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    /// Check the configuration for values that can't work.
    pub fn validate(&self) -> SessionResult<()> {
        if self.secret.keys().iter().any(String::is_empty) {
            return Err(SessionError::InvalidArgument(
                "session secrets must not be empty".to_owned(),
            ));
        }
        if self.name.is_empty() || !self.name.bytes().all(is_token_byte) {
            return Err(SessionError::InvalidArgument(format!(
                "invalid session cookie name {:?}",
                self.name
            )));
        }
        if !self.cookie.path.starts_with('/') {
            return Err(SessionError::InvalidArgument(format!(
                "session cookie path must start with '/', got {:?}",
                self.cookie.path
            )));
        }
        Ok(())
    }

    /// Cookie policy for a brand new session on a request from `origin`
    pub(crate) fn new_session_cookie(&self, origin: Option<&RequestOrigin>) -> ResponsePolicy {
        ResponsePolicy::new(
            self.cookie.clone().with_defaults(origin),
            self.encoder.clone(),
        )
    }

    /// Cookie policy for a session restored from the store
    pub(crate) fn restored_session_cookie(&self, stored: CookiePolicy) -> ResponsePolicy {
        ResponsePolicy::new(stored, self.encoder.clone())
    }
}

/// RFC 6265 cookie-name token characters
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}
