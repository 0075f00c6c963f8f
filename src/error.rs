//! Error types

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can happen during session handling.
///
/// A cookie that fails signature verification is not an error: it is treated
/// the same as a missing cookie, and a fresh session is issued instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Malformed configuration or argument, such as an empty secret list
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Error serializing or deserializing the session record or a session value
    #[error("Failed to serialize/deserialize session: {0}")]
    Serialization(Box<dyn std::error::Error + Send + Sync>),
    /// A generic error from the storage backend. This error type can be
    /// used when implementing a custom session store.
    #[error("Storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for SessionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(Box::new(value))
    }
}
