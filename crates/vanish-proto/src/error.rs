//! Protocol error types.

use thiserror::Error;

/// Errors from parsing identifiers, links and wire payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Text is not a lower-case hyphenated UUID
    #[error("invalid secret id: {0:?}")]
    InvalidSecretId(String),

    /// Expiration is not one of the accepted durations
    #[error("invalid expiration: {0}")]
    InvalidExpiration(i32),

    /// Link could not be parsed as a URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parsed but its fragment is not a share link
    #[error("unexpected URL: {0:?}")]
    InvalidUrlKind(String),

    /// JSON encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ProtoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
