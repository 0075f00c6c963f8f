//! Signed cookie values.
//!
//! Uses HMAC-SHA256 to sign session IDs, producing tokens of the form
//! `<value>.<base64 signature>` (standard alphabet, no `=` padding).

use std::fmt;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{SessionError, SessionResult};

type HmacSha256 = Hmac<Sha256>;

/// Key material used to sign and verify session cookies.
///
/// Holds one or more secrets. Only the first secret is used for signing, while
/// all secrets are tried in order during verification. To rotate the secret
/// without invalidating existing sessions, put the new secret first and keep
/// the old ones after it.
#[derive(Clone)]
pub struct Secret {
    keys: Vec<String>,
}

impl Secret {
    /// A single secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            keys: vec![secret.into()],
        }
    }

    /// An ordered list of secrets, where the first one signs. Fails if the list is empty.
    pub fn rotating<I, S>(secrets: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = secrets.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(SessionError::InvalidArgument(
                "at least one secret is required".to_owned(),
            ));
        }
        Ok(Self { keys })
    }

    /// The secret used for signing.
    pub fn signing_key(&self) -> &str {
        &self.keys[0]
    }

    /// All secrets, in verification order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {}])", self.keys.len())
    }
}

/// Sign `value` with the signing key of `secret`.
pub fn sign(value: &str, secret: &Secret) -> String {
    sign_with_key(value, secret.signing_key())
}

/// Verify a signed token against every key of `secret`, returning the signed value
/// on the first match. Returns `None` for tampered, foreign, empty, or malformed tokens.
pub fn unsign(token: &str, secret: &Secret) -> Option<String> {
    let candidate = token
        .rfind('.')
        .map(|separator| &token[..separator])
        .unwrap_or_default();

    secret.keys().iter().find_map(|key| {
        let expected = sign_with_key(candidate, key);
        bool::from(expected.as_bytes().ct_eq(token.as_bytes())).then(|| candidate.to_owned())
    })
}

fn sign_with_key(value: &str, key: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(value.as_bytes());
    let digest = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{value}.{digest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_unpadded_base64_of_32_bytes() {
        let token = sign("abc", &Secret::new("key"));
        let (value, digest) = token.rsplit_once('.').unwrap();
        assert_eq!(value, "abc");
        assert_eq!(digest.len(), 43);
        assert!(!digest.contains('='));
    }

    #[test]
    fn value_containing_dots_is_split_at_last_dot() {
        let secret = Secret::new("key");
        let token = sign("a.b.c", &secret);
        assert_eq!(unsign(&token, &secret).as_deref(), Some("a.b.c"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let secret = Secret::rotating(["first", "second"]).unwrap();
        let debug = format!("{secret:?}");
        assert!(!debug.contains("first"));
        assert!(debug.contains('2'));
    }
}
