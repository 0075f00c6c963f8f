use std::sync::Arc;

use rocket::{fairing::Fairing, Build, Orbit, Rocket};

use crate::SessionConfig;

/**
A Rocket fairing that enables sessions. Once attached, the [`Session`](crate::Session)
request guard can be used in route handlers.

# Example
```rust
use signed_session::{Session, SessionConfig, SessionFairing};

#[rocket::post("/login")]
async fn login(mut session: Session<'_>) -> &'static str {
    session.set_key("user_id", "123").await.unwrap();
    session.save().await.unwrap();
    "Logged in"
}

#[rocket::launch]
fn rocket() -> _ {
    let config = SessionConfig::builder()
        .secret("my-secret")
        .with_cookie(|cookie| cookie.max_age = Some(24 * 60 * 60))
        .build();

    rocket::build()
        .attach(SessionFairing::new(config))
        .mount("/", rocket::routes![login])
}
```
*/
pub struct SessionFairing {
    config: Arc<SessionConfig>,
}

impl SessionFairing {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl From<SessionConfig> for SessionFairing {
    fn from(config: SessionConfig) -> Self {
        Self::new(config)
    }
}

#[rocket::async_trait]
impl Fairing for SessionFairing {
    fn info(&self) -> rocket::fairing::Info {
        use rocket::fairing::Kind;
        rocket::fairing::Info {
            name: "Signed Session",
            kind: Kind::Ignite | Kind::Shutdown | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> Result<Rocket<Build>, Rocket<Build>> {
        if let Err(e) = self.config.validate() {
            log::error!("Invalid session configuration: {e}");
            return Err(rocket);
        }

        log::debug!("Setting up session store...");
        if let Err(e) = self.config.store.setup().await {
            log::warn!("Error during session store setup: {e}");
        }

        Ok(rocket.manage(self.config.clone()))
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        log::debug!("Shutting down session store...");
        if let Err(e) = self.config.store.shutdown().await {
            log::warn!("Error during session store shutdown: {e}");
        }
    }
}
