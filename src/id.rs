//! Session identifier generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Number of random bytes in a session identifier (32 characters once encoded)
pub const SESSION_ID_BYTES: usize = 24;

/// Generate a URL-safe random string from `byte_len` bytes of
/// cryptographically secure randomness.
///
/// The output is standard base64 with `+` and `/` replaced by `-` and `_`,
/// without `=` padding, so it is safe to use in URLs and cookie values.
/// The output length only depends on `byte_len` (e.g. 24 bytes → 32 characters).
pub fn generate_uid(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill_bytes(&mut bytes);
    encode_uid(&bytes)
}

/// Generate a new session identifier.
pub fn generate_session_id() -> String {
    generate_uid(SESSION_ID_BYTES)
}

fn encode_uid(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_url_safe_and_unpadded() {
        // 0xfb 0xff encodes to "+/8=" with the standard alphabet
        assert_eq!(encode_uid(&[0xfb, 0xff]), "-_8");
        assert_eq!(encode_uid(&[]), "");
    }

    #[test]
    fn encoding_is_deterministic() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(encode_uid(&bytes), encode_uid(&bytes));
        assert_eq!(encode_uid(&bytes), "AQIDBAUGBwg");
    }
}
