//! Storage contract for secrets
//!
//! The trait is synchronous; async callers move store calls onto a blocking
//! pool. Backends own TTL enforcement: a secret must become invisible no
//! later than `expiration` seconds after `put` returns.

mod chaotic;
mod error;
mod memory;

use std::time::Duration;

pub use chaotic::ChaoticStore;
pub use error::StoreError;
pub use memory::MemoryStore;
use vanish_proto::{Secret, SecretId};

/// Persistence for secrets
///
/// Must be Clone (handlers and the sweeper share one store), Send + Sync and
/// synchronous. Implementations share state via Arc, so clones see the same
/// data.
///
/// `get` followed by `delete` is two separate calls. Nothing in the contract
/// makes them atomic.
pub trait SecretStore: Clone + Send + Sync + 'static {
    /// Load a live secret.
    ///
    /// Fails with [`StoreError::NotFound`] if absent, deleted or expired.
    fn get(&self, id: &SecretId) -> Result<Secret, StoreError>;

    /// Persist `secret` under `id` with a TTL of `secret.expiration` seconds.
    fn put(&self, id: &SecretId, secret: &Secret) -> Result<(), StoreError>;

    /// Remove a secret. Returns whether a live secret existed.
    ///
    /// Idempotent: deleting an absent id is `Ok(false)`, not an error.
    fn delete(&self, id: &SecretId) -> Result<bool, StoreError>;

    /// Whether the stored secret is one-time. Never deletes.
    fn status(&self, id: &SecretId) -> Result<bool, StoreError>;

    /// Drop expired entries and return how many were removed.
    ///
    /// Backends with native expiry have nothing to do.
    fn purge_expired(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// TTL of a secret as a [`Duration`].
///
/// # Errors
///
/// [`StoreError::InvalidExpiration`] for zero or negative expirations.
pub fn ttl(secret: &Secret) -> Result<Duration, StoreError> {
    u64::try_from(secret.expiration)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or(StoreError::InvalidExpiration(secret.expiration))
}
