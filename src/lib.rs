#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

/*!
# Overview
Server-side sessions for stateless HTTP handlers, identified by a signed cookie.

- Session IDs are 24 bytes of secure randomness, sent to the client as
  `<id>.<signature>` where the signature is an HMAC-SHA256 of the ID. Tampered or
  foreign cookies are ignored, and a new session is started instead.
- Secrets can be rotated: the first secret signs, all secrets are tried when verifying.
- Session records (data plus the cookie policy they were issued with) are kept in a
  pluggable expiring store. The store's time-to-live follows the cookie's `max_age`
  (or `expires`), and rolling sessions renew it on every request.
- Persistence is explicit: nothing is written unless you call [`Session::save`], or
  enable `save_uninitialized`.
- The core is framework-agnostic: a framework only needs to implement the
  [`SessionCookies`] trait for its cookie jar. A [Rocket](https://rocket.rs)
  integration is included behind the `rocket` feature.

# Usage

```rust
use signed_session::{Session, SessionConfig, SessionFairing};

#[rocket::post("/login")]
async fn login(session: Session<'_>) -> Result<&'static str, rocket::http::Status> {
    // Regenerate the session on login to prevent session fixation
    let mut session = session
        .regenerate()
        .await
        .map_err(|_| rocket::http::Status::InternalServerError)?;
    session
        .set_key("user_id", "123")
        .await
        .map_err(|_| rocket::http::Status::InternalServerError)?;
    session
        .save()
        .await
        .map_err(|_| rocket::http::Status::InternalServerError)?;
    Ok("Logged in")
}

#[rocket::get("/user")]
fn user(session: Session<'_>) -> String {
    match session.get_key::<String>("user_id") {
        Some(user_id) => format!("Logged in as user {user_id}!"),
        None => "Not logged in".to_owned(),
    }
}

#[rocket::launch]
fn rocket() -> _ {
    rocket::build()
        .attach(SessionFairing::new(
            SessionConfig::builder().secret("my-secret").build(),
        ))
        .mount("/", rocket::routes![login, user])
}
```

# Storage

The default store is the in-memory [`storage::memory::MemoryStore`], intended for
development and testing. To use your own store, implement the
[`SessionStore`](crate::storage::SessionStore) trait:

```rust
use std::time::Duration;
use signed_session::{error::SessionResult, storage::{SessionRecord, SessionStore}};

pub struct MyCustomStore {}

#[async_trait::async_trait]
impl SessionStore for MyCustomStore {
    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>> {
        // Load the record, returning `None` if it's missing or expired
        todo!()
    }

    async fn set(&self, id: &str, record: &SessionRecord, ttl: Option<Duration>) -> SessionResult<()> {
        // Save the record. A `ttl` of `None` means the store's default retention applies.
        todo!()
    }

    async fn destroy(&self, id: &str) -> SessionResult<()> {
        todo!()
    }

    async fn touch(&self, id: &str, ttl: Duration) -> SessionResult<()> {
        // Reset the record's TTL
        todo!()
    }
}
```

Use [`error::SessionError::Backend`] for your store's errors: they are returned
unchanged from the session operation that triggered them.

# Feature flags

| Name    | Description    |
|---------|----------------|
| `rocket` | (default) Rocket fairing and request guard. |
| `rocket_okapi`  | Enables support for the [rocket_okapi](https://docs.rs/crate/rocket_okapi) crate if needed. |
*/

mod config;
mod cookie;
mod id;
mod session;
mod signature;

#[cfg(feature = "rocket")]
mod fairing;
#[cfg(feature = "rocket")]
mod guard;

pub mod error;
pub mod storage;
pub use config::{SessionConfig, SessionConfigBuilder, DEFAULT_COOKIE_NAME};
pub use cookie::{
    CookieEncoder, CookiePolicy, CookiePriority, RequestContext, RequestOrigin, ResponsePolicy,
    SameSite, SessionCookies,
};
#[cfg(feature = "rocket")]
pub use fairing::SessionFairing;
pub use id::{generate_session_id, generate_uid, SESSION_ID_BYTES};
pub use session::{Session, SessionState};
pub use signature::{sign, unsign, Secret};
