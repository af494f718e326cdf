//! Store error types.
//!
//! - `NotFound`: the id is absent, consumed or expired
//! - `InvalidExpiration`: the secret carries no usable TTL
//! - `Serialization`: a stored value could not be encoded or decoded
//! - `Io`: the backend itself failed

use thiserror::Error;
use vanish_proto::ProtoError;

/// Errors from [`SecretStore`](super::SecretStore) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No live secret under this id
    #[error("secret not found")]
    NotFound,

    /// Expiration must be a positive number of seconds
    #[error("invalid expiration: {0}")]
    InvalidExpiration(i32),

    /// Stored value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend I/O failure (file system, database, network)
    #[error("I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Returns true for the "absent" outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<ProtoError> for StoreError {
    fn from(err: ProtoError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
