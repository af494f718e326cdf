//! Secret lifecycle orchestration.
//!
//! Per id the lifecycle is `Absent -> Stored -> Absent`. A secret leaves
//! `Stored` when a one-time read deletes it, when it is deleted explicitly,
//! or when the store's TTL expires it.
//!
//! # Known race
//!
//! [`SecretService::retrieve_secret`] reads and then deletes in two separate
//! store calls. Two concurrent reads of the same one-time secret can both
//! finish `get` before either `delete` runs, and both callers then receive
//! the ciphertext. Closing this would need an atomic get-and-delete from the
//! backend, which the [`SecretStore`] contract does not require.

use tracing::{debug, error, warn};
use vanish_proto::{Secret, SecretId};

use crate::{
    env::Environment,
    error::ServiceError,
    policy::{Policy, PolicyViolation},
    store::{SecretStore, StoreError},
};

/// Validates, stores and hands out secrets.
///
/// Holds no mutable state of its own; operations on different ids are
/// independent and may run concurrently from many threads.
#[derive(Clone)]
pub struct SecretService<S: SecretStore, E: Environment> {
    store: S,
    env: E,
    policy: Policy,
}

impl<S: SecretStore, E: Environment> SecretService<S, E> {
    /// Create a service over `store` enforcing `policy`.
    pub fn new(store: S, env: E, policy: Policy) -> Self {
        Self { store, env, policy }
    }

    /// Policy this service enforces.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate `secret`, store it under a fresh id and return the id.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] if the secret breaks the policy
    /// - [`ServiceError::Configuration`] if the policy's maximum expiration is
    ///   itself invalid
    /// - [`ServiceError::Store`] if the backend fails
    pub fn create_secret(&self, secret: &Secret) -> Result<SecretId, ServiceError> {
        match self.policy.check(secret) {
            Ok(()) => {},
            Err(PolicyViolation::Request(err)) => {
                debug!(reason = %err, "rejected secret");
                return Err(err.into());
            },
            Err(PolicyViolation::Configuration(err)) => {
                error!(error = %err, "server misconfiguration");
                return Err(ServiceError::Configuration(err));
            },
        }

        let id = self.env.secret_id();
        self.store.put(&id, secret).map_err(|err| {
            warn!(%id, error = %err, "failed to store secret");
            ServiceError::Store(err)
        })?;

        debug!(%id, expiration = secret.expiration, one_time = secret.one_time, "stored secret");
        Ok(id)
    }

    /// Fetch a secret, deleting it first if it is one-time.
    ///
    /// The secret is only returned after the delete succeeded. Callers must
    /// not send anything to the network before this returns, so a failed
    /// delete never leaves a one-time secret both delivered and stored.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if absent, consumed or expired
    /// - [`ServiceError::Clear`] if the one-time delete failed
    /// - [`ServiceError::Retrieve`] if the read failed
    pub fn retrieve_secret(&self, id: &SecretId) -> Result<Secret, ServiceError> {
        let secret = self.store.get(id).map_err(|err| match err {
            StoreError::NotFound => ServiceError::NotFound,
            other => {
                warn!(%id, error = %other, "failed to read secret");
                ServiceError::Retrieve(other)
            },
        })?;

        if secret.one_time {
            // A concurrent reader may already have deleted it; that still
            // counts as cleared.
            self.store.delete(id).map_err(|err| {
                warn!(%id, error = %err, "failed to clear one-time secret");
                ServiceError::Clear(err)
            })?;
            debug!(%id, "one-time secret consumed");
        }

        Ok(secret)
    }

    /// Delete a secret without reading it. Returns whether it existed.
    pub fn delete_secret(&self, id: &SecretId) -> Result<bool, ServiceError> {
        let existed = self.store.delete(id).map_err(|err| {
            warn!(%id, error = %err, "failed to delete secret");
            ServiceError::Delete(err)
        })?;
        debug!(%id, existed, "secret deleted");
        Ok(existed)
    }

    /// Whether the secret is one-time. Never deletes it.
    pub fn secret_status(&self, id: &SecretId) -> Result<bool, ServiceError> {
        self.store.status(id).map_err(|err| match err {
            StoreError::NotFound => ServiceError::NotFound,
            other => {
                warn!(%id, error = %other, "failed to read secret status");
                ServiceError::Retrieve(other)
            },
        })
    }

    /// Drop expired secrets from stores without native expiry.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        self.store.purge_expired()
    }
}
