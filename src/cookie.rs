//! Session cookie policy and the cookie collaborator interface

use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The cookie's `SameSite` attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// The cookie's `Priority` attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookiePriority {
    Low,
    Medium,
    High,
}

/**
Attributes of the session cookie. This is the serializable part of the cookie
policy: it is stored alongside the session data, and restored with it.

`max_age` and `expires` can both be set. `max_age` takes precedence when deriving
the store's time-to-live (see [`CookiePolicy::store_ttl`]), so if both are set they
should point to the same moment.
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiePolicy {
    /// `Path` attribute (default: `"/"`)
    pub path: String,
    /// `Domain` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// `HttpOnly` attribute. When unset in the configuration, defaults to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `SameSite` attribute. When unset in the configuration, defaults to `Lax`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// `Secure` attribute. When unset in the configuration, defaults to `true`, except
    /// for local development hosts served over plain HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// `Max-Age` attribute, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    /// `Expires` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<OffsetDateTime>,
    /// `Priority` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<CookiePriority>,
    /// `Partitioned` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            path: "/".to_owned(),
            domain: None,
            http_only: None,
            same_site: None,
            secure: None,
            max_age: None,
            expires: None,
            priority: None,
            partitioned: None,
        }
    }
}

impl CookiePolicy {
    /// Time-to-live to hand to the session store, derived from the cookie's expiration.
    ///
    /// - `max_age` set (and non-zero): `max_age` seconds
    /// - otherwise `expires` set: time until `expires`, rounded up to whole seconds
    ///   (zero if it's already in the past)
    /// - neither: `None`, letting the store apply its own default retention
    pub fn store_ttl(&self) -> Option<Duration> {
        self.store_ttl_at(OffsetDateTime::now_utc())
    }

    pub(crate) fn store_ttl_at(&self, now: OffsetDateTime) -> Option<Duration> {
        if let Some(max_age) = self.max_age_ttl() {
            return Some(max_age);
        }
        let remaining = self.expires? - now;
        let mut secs = remaining.whole_seconds();
        if remaining.subsec_nanoseconds() > 0 {
            secs += 1;
        }
        Some(Duration::from_secs(u64::try_from(secs).unwrap_or(0)))
    }

    /// Time-to-live derived from `max_age` alone. This is what rolling sessions renew.
    pub fn max_age_ttl(&self) -> Option<Duration> {
        self.max_age
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Fill in the environment-derived defaults for any unset attributes.
    pub(crate) fn with_defaults(mut self, origin: Option<&RequestOrigin>) -> Self {
        self.http_only.get_or_insert(true);
        self.same_site.get_or_insert(SameSite::Lax);
        self.secure
            .get_or_insert_with(|| !origin.is_some_and(RequestOrigin::is_local_plain_http));
        self
    }
}

/// Transform applied to the signed token before it's written to the cookie.
/// This can't be stored with the session, so it's always taken from the live configuration.
#[derive(Clone)]
pub struct CookieEncoder(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl CookieEncoder {
    pub fn new<F>(encode: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(encode))
    }

    pub fn encode(&self, value: &str) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for CookieEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CookieEncoder(..)")
    }
}

/// The full policy used when emitting the cookie: the persistable [`CookiePolicy`]
/// plus an optional [`CookieEncoder`].
#[derive(Clone, Debug)]
pub struct ResponsePolicy {
    policy: CookiePolicy,
    encoder: Option<CookieEncoder>,
}

impl ResponsePolicy {
    pub fn new(policy: CookiePolicy, encoder: Option<CookieEncoder>) -> Self {
        Self { policy, encoder }
    }

    /// The serializable attributes, as written to the store.
    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    pub fn encoder(&self) -> Option<&CookieEncoder> {
        self.encoder.as_ref()
    }

    /// Apply the encoder (if any) to a cookie value.
    pub fn encode_value(&self, value: &str) -> String {
        match &self.encoder {
            Some(encoder) => encoder.encode(value),
            None => value.to_owned(),
        }
    }
}

/**
Read/write access to the request and response cookies. This is the integration
point with a web framework: the framework's cookie jar only needs to implement
these three methods. The session never parses or formats `Set-Cookie` headers itself.

Implementations should apply [`ResponsePolicy::encode_value`] to the value in `set`.
*/
pub trait SessionCookies: Send + Sync {
    /// Get the value of a request cookie.
    fn get(&self, name: &str) -> Option<String>;

    /// Set a response cookie.
    fn set(&self, name: &str, value: &str, policy: &ResponsePolicy);

    /// Remove a cookie. The path and domain of `policy` identify the cookie to remove.
    fn delete(&self, name: &str, policy: &ResponsePolicy);
}

/// Where the request was addressed, used to pick the default `Secure` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOrigin {
    pub host: String,
    pub https: bool,
}

impl RequestOrigin {
    pub fn new(host: impl Into<String>, https: bool) -> Self {
        Self {
            host: host.into(),
            https,
        }
    }

    /// Whether this is a local development host served over plain HTTP.
    pub fn is_local_plain_http(&self) -> bool {
        if self.https {
            return false;
        }
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        host == "localhost" || host.ends_with(".localhost") || host == "127.0.0.1" || host == "::1"
    }
}

/// Everything the session needs from the current request.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    pub cookies: &'a dyn SessionCookies,
    pub origin: Option<&'a RequestOrigin>,
}

impl<'a> RequestContext<'a> {
    pub fn new(cookies: &'a dyn SessionCookies) -> Self {
        Self {
            cookies,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: &'a RequestOrigin) -> Self {
        self.origin = Some(origin);
        self
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn expires_is_rounded_up_to_whole_seconds() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        let policy = CookiePolicy {
            expires: Some(datetime!(2024-01-01 00:00:10.2 UTC)),
            ..Default::default()
        };
        assert_eq!(policy.store_ttl_at(now), Some(Duration::from_secs(11)));
    }

    #[test]
    fn expires_in_the_past_is_zero() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        let policy = CookiePolicy {
            expires: Some(datetime!(2023-12-31 23:59:00 UTC)),
            ..Default::default()
        };
        assert_eq!(policy.store_ttl_at(now), Some(Duration::ZERO));
    }

    #[test]
    fn zero_max_age_falls_back_to_expires() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        let policy = CookiePolicy {
            max_age: Some(0),
            expires: Some(datetime!(2024-01-01 00:01:00 UTC)),
            ..Default::default()
        };
        assert_eq!(policy.store_ttl_at(now), Some(Duration::from_secs(60)));
    }

    #[test]
    fn defaults_fill_only_unset_attributes() {
        let policy = CookiePolicy {
            same_site: Some(SameSite::Strict),
            ..Default::default()
        }
        .with_defaults(None);
        assert_eq!(policy.http_only, Some(true));
        assert_eq!(policy.same_site, Some(SameSite::Strict));
        assert_eq!(policy.secure, Some(true));
    }

    #[test]
    fn local_plain_http_is_not_secure_by_default() {
        let local = RequestOrigin::new("localhost", false);
        let policy = CookiePolicy::default().with_defaults(Some(&local));
        assert_eq!(policy.secure, Some(false));

        let local_tls = RequestOrigin::new("localhost", true);
        let policy = CookiePolicy::default().with_defaults(Some(&local_tls));
        assert_eq!(policy.secure, Some(true));

        let remote = RequestOrigin::new("example.com", false);
        let policy = CookiePolicy::default().with_defaults(Some(&remote));
        assert_eq!(policy.secure, Some(true));
    }
}
