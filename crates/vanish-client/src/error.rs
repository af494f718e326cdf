//! Client error types.

use thiserror::Error;
use vanish_crypto::CryptoError;
use vanish_proto::ProtoError;

/// Errors from [`Client`](crate::Client) calls and the share helpers.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request did not complete (connection, TLS, timeout, body)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, or the raw body
        message: String,
    },

    /// Encryption or decryption failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A link, id or body could not be parsed
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The API base URL is not usable
    #[error("invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The link does not carry a key and none was supplied
    #[error("this link needs a decryption key")]
    MissingKey,

    /// A local task could not finish
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Returns true if the secret is absent, consumed or expired.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }

    /// Returns true if retrying the same call cannot succeed.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Http(err) => !(err.is_timeout() || err.is_connect()),
            Self::Server { status, .. } => *status < 500,
            _ => true,
        }
    }
}
