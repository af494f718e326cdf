//! Fault-injecting store wrapper
//!
//! Wraps any store and fails a configurable share of operations with
//! [`StoreError::Io`]. Failures follow a seeded generator, so a chaos run is
//! reproducible from its seed.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use vanish_proto::{Secret, SecretId};

use super::{SecretStore, StoreError};

const DEFAULT_SEED: u64 = 0x5EC2_E7F0_0D15_EA5E;

/// Store wrapper that randomly fails operations
#[derive(Clone)]
pub struct ChaoticStore<S: SecretStore> {
    inner: S,
    /// 0.0 never fails, 1.0 always fails
    failure_rate: f64,
    rng: Arc<Mutex<ChaosRng>>,
    operations: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

/// Linear congruential generator (Numerical Recipes constants)
struct ChaosRng {
    state: u64,
}

impl ChaosRng {
    fn next_unit(&mut self) -> f64 {
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = A.wrapping_mul(self.state).wrapping_add(C) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: SecretStore> ChaoticStore<S> {
    /// Wrap `inner`, failing `failure_rate` of operations.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is outside `[0.0, 1.0]`.
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, DEFAULT_SEED)
    }

    /// Wrap `inner` with an explicit seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is outside `[0.0, 1.0]`.
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaosRng { state: seed })),
            operations: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wrapped store, for checking state after a chaos run.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Operations attempted through this wrapper.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::Relaxed)
    }

    /// Operations that were failed on purpose.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Count the operation and decide whether it fails.
    fn roll(&self, operation: &str) -> Result<(), StoreError> {
        self.operations.fetch_add(1, Ordering::Relaxed);

        #[allow(clippy::expect_used)]
        let fail = self.rng.lock().expect("ChaosRng mutex poisoned").next_unit() < self.failure_rate;
        if fail {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(operation, "injecting store failure");
            return Err(StoreError::Io(format!("chaotic failure injection ({operation})")));
        }
        Ok(())
    }
}

impl<S: SecretStore> SecretStore for ChaoticStore<S> {
    fn get(&self, id: &SecretId) -> Result<Secret, StoreError> {
        self.roll("get")?;
        self.inner.get(id)
    }

    fn put(&self, id: &SecretId, secret: &Secret) -> Result<(), StoreError> {
        self.roll("put")?;
        self.inner.put(id, secret)
    }

    fn delete(&self, id: &SecretId) -> Result<bool, StoreError> {
        self.roll("delete")?;
        self.inner.delete(id)
    }

    fn status(&self, id: &SecretId) -> Result<bool, StoreError> {
        self.roll("status")?;
        self.inner.status(id)
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        self.roll("purge_expired")?;
        self.inner.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use vanish_proto::Expiration;

    use super::*;
    use crate::{env::test_env::TestEnv, store::MemoryStore};

    fn secret() -> Secret {
        Secret::new("ciphertext", Expiration::OneHour, false)
    }

    #[test]
    fn zero_rate_never_fails() {
        let chaotic = ChaoticStore::new(MemoryStore::new(TestEnv::default()), 0.0);
        for n in 0..100u8 {
            let id = SecretId::from_random_bytes([n; 16]);
            chaotic.put(&id, &secret()).expect("should not fail with 0% rate");
            chaotic.get(&id).expect("should not fail with 0% rate");
        }
        assert_eq!(chaotic.operation_count(), 200);
        assert_eq!(chaotic.failure_count(), 0);
        assert_eq!(chaotic.inner().len(), 100);
    }

    #[test]
    fn full_rate_always_fails() {
        let chaotic = ChaoticStore::new(MemoryStore::new(TestEnv::default()), 1.0);
        let id = SecretId::from_random_bytes([1; 16]);

        assert!(matches!(chaotic.put(&id, &secret()), Err(StoreError::Io(_))));
        assert!(chaotic.get(&id).is_err());
        assert!(chaotic.delete(&id).is_err());
        assert!(chaotic.status(&id).is_err());
        assert!(chaotic.inner().is_empty(), "failed put never reaches the inner store");
    }

    #[test]
    fn same_seed_same_failures() {
        let a = ChaoticStore::with_seed(MemoryStore::new(TestEnv::default()), 0.5, 42);
        let b = ChaoticStore::with_seed(MemoryStore::new(TestEnv::default()), 0.5, 42);

        for n in 0..100u8 {
            let id = SecretId::from_random_bytes([n; 16]);
            assert_eq!(
                a.put(&id, &secret()).is_ok(),
                b.put(&id, &secret()).is_ok(),
                "determinism violated at iteration {n}"
            );
        }
        assert!(a.failure_count() > 0);
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between 0.0 and 1.0")]
    fn rejects_invalid_rate() {
        let _ = ChaoticStore::new(MemoryStore::new(TestEnv::default()), 1.5);
    }
}
