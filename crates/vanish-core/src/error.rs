//! Service error types.
//!
//! Display strings of [`ServiceError`] and [`ValidationError`] are shown to
//! HTTP clients verbatim. Underlying store errors stay in `source()` for logs.

use thiserror::Error;

use crate::store::StoreError;

/// A request that breaks the validation rules. Never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Expiration is not 3600, 86400 or 604800
    #[error("Invalid expiration specified")]
    InvalidExpiration,

    /// Policy requires one-time secrets
    #[error("Secret must be one time download")]
    MustBeOneTime,

    /// Expiration is longer than the configured maximum
    #[error("Expiration exceeds server maximum")]
    ExpirationExceedsMaximum,

    /// Message exceeds the configured maximum length
    #[error("The encrypted message is too long")]
    MessageTooLong,
}

/// Operator misconfiguration, distinct from backend failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Maximum expiration override is not itself a valid expiration
    #[error("maximum expiration {0} is not one of 3600, 86400, 604800")]
    InvalidMaxExpiration(i32),
}

/// Errors returned by [`SecretService`](crate::SecretService).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request was rejected (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No live secret under this id (404)
    #[error("Secret not found")]
    NotFound,

    /// The server policy is invalid (500)
    #[error("Server misconfiguration")]
    Configuration(#[source] ConfigurationError),

    /// Persisting a new secret failed (500)
    #[error("Failed to store secret in database")]
    Store(#[source] StoreError),

    /// Deleting a one-time secret after reading it failed (500)
    #[error("Failed to clear secret")]
    Clear(#[source] StoreError),

    /// Reading a secret failed (500)
    #[error("Failed to retrieve secret")]
    Retrieve(#[source] StoreError),

    /// Explicitly deleting a secret failed (500)
    #[error("Failed to delete secret")]
    Delete(#[source] StoreError),
}

impl ServiceError {
    /// Returns true if the caller is at fault and should not retry as-is.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound)
    }

    /// Returns true if the failure came from the store backend.
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Clear(_) | Self::Retrieve(_) | Self::Delete(_))
    }
}
