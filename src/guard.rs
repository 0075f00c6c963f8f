use std::sync::Arc;

use rocket::{
    http::{self, Cookie, CookieJar, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request,
};

use crate::{
    cookie::{RequestContext, RequestOrigin, ResponsePolicy, SameSite, SessionCookies},
    error::SessionError,
    Session, SessionConfig,
};

/// The session request guard. Fails with `500 Internal Server Error` if the session
/// store returns an error; an invalid or missing cookie just yields a new session.
///
/// Each use of the guard loads the session again, so use it once per handler and
/// pass the session along explicitly.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session<'r> {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = get_config(req.rocket());
        let origin: &'r Option<RequestOrigin> = req.local_cache(|| request_origin(req));
        let mut context = RequestContext::new(req.cookies());
        if let Some(origin) = origin {
            context = context.with_origin(origin);
        }

        match Session::initialize(context, config).await {
            Ok(session) => Outcome::Success(session),
            Err(e) => {
                log::error!("Error while loading session: {e}");
                Outcome::Error((Status::InternalServerError, e))
            }
        }
    }
}

/// Get session configuration from Rocket state
#[inline(always)]
fn get_config(rocket: &rocket::Rocket<rocket::Orbit>) -> &SessionConfig {
    rocket
        .state::<Arc<SessionConfig>>()
        .expect("The SessionFairing should be attached to the server")
}

fn request_origin(req: &Request<'_>) -> Option<RequestOrigin> {
    let host = req.host()?;
    Some(RequestOrigin::new(
        host.domain().as_str(),
        req.rocket().config().tls_enabled(),
    ))
}

impl SessionCookies for CookieJar<'_> {
    fn get(&self, name: &str) -> Option<String> {
        CookieJar::get(self, name).map(|cookie| cookie.value().to_owned())
    }

    fn set(&self, name: &str, value: &str, policy: &ResponsePolicy) {
        self.add(create_session_cookie(name, value, policy));
    }

    fn delete(&self, name: &str, policy: &ResponsePolicy) {
        let mut remove_cookie =
            Cookie::build(name.to_owned()).path(policy.policy().path.clone());
        if let Some(domain) = &policy.policy().domain {
            remove_cookie = remove_cookie.domain(domain.clone());
        }
        self.remove(remove_cookie.build());
    }
}

/// Create the session cookie. `Priority` isn't emitted by Rocket.
fn create_session_cookie(name: &str, value: &str, policy: &ResponsePolicy) -> Cookie<'static> {
    let attributes = policy.policy();
    let mut cookie = Cookie::build((name.to_owned(), policy.encode_value(value)))
        .path(attributes.path.clone());

    if let Some(http_only) = attributes.http_only {
        cookie = cookie.http_only(http_only);
    }
    if let Some(same_site) = attributes.same_site {
        cookie = cookie.same_site(match same_site {
            SameSite::Strict => http::SameSite::Strict,
            SameSite::Lax => http::SameSite::Lax,
            SameSite::None => http::SameSite::None,
        });
    }
    if let Some(secure) = attributes.secure {
        cookie = cookie.secure(secure);
    }
    if let Some(domain) = &attributes.domain {
        cookie = cookie.domain(domain.clone());
    }
    if let Some(max_age) = attributes.max_age {
        cookie = cookie.max_age(Duration::seconds(i64::try_from(max_age).unwrap_or(i64::MAX)));
    }
    if let Some(expires) = attributes.expires {
        cookie = cookie.expires(expires);
    }
    if let Some(partitioned) = attributes.partitioned {
        cookie = cookie.partitioned(partitioned);
    }

    cookie.build()
}

/// If using rocket-okapi, this implements OpenApiFromRequest for Session to ignore the request guard
#[cfg(feature = "rocket_okapi")]
impl<'r> rocket_okapi::request::OpenApiFromRequest<'r> for Session<'r> {
    fn from_request_input(
        _gen: &mut rocket_okapi::gen::OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<rocket_okapi::request::RequestHeaderInput> {
        Ok(rocket_okapi::request::RequestHeaderInput::None)
    }
}
