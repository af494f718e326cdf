#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use vanish_proto::{Secret, SecretId};

use super::{SecretStore, StoreError, ttl};
use crate::env::Environment;

/// In-memory store for tests, simulation and single-process deployments
///
/// Entries remember when they were stored; an entry whose age reaches its TTL
/// is treated as absent and removed on the next access or by
/// [`purge_expired`](SecretStore::purge_expired). Uses `lock().expect()`,
/// which panics if the mutex is poisoned.
#[derive(Clone)]
pub struct MemoryStore<E: Environment> {
    env: E,
    entries: Arc<Mutex<HashMap<SecretId, Entry<E::Instant>>>>,
}

struct Entry<I> {
    secret: Secret,
    stored_at: I,
    ttl: Duration,
}

impl<E: Environment> MemoryStore<E> {
    /// Create an empty store reading time from `env`.
    pub fn new(env: E) -> Self {
        Self { env, entries: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Number of entries held, including expired ones not yet purged.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("Mutex poisoned").len()
    }

    /// True if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry<E::Instant>) -> bool {
        self.env.now() - entry.stored_at >= entry.ttl
    }

    /// Run `f` on the live entry for `id`, dropping it first if expired.
    #[allow(clippy::expect_used)]
    fn with_live<T>(
        &self,
        id: &SecretId,
        f: impl FnOnce(&mut HashMap<SecretId, Entry<E::Instant>>) -> T,
    ) -> T {
        let mut entries = self.entries.lock().expect("Mutex poisoned");
        if entries.get(id).is_some_and(|entry| self.is_expired(entry)) {
            entries.remove(id);
        }
        f(&mut entries)
    }
}

impl<E: Environment> SecretStore for MemoryStore<E> {
    fn get(&self, id: &SecretId) -> Result<Secret, StoreError> {
        self.with_live(id, |entries| {
            entries.get(id).map(|entry| entry.secret.clone()).ok_or(StoreError::NotFound)
        })
    }

    #[allow(clippy::expect_used)]
    fn put(&self, id: &SecretId, secret: &Secret) -> Result<(), StoreError> {
        let ttl = ttl(secret)?;
        let entry = Entry { secret: secret.clone(), stored_at: self.env.now(), ttl };
        self.entries.lock().expect("Mutex poisoned").insert(*id, entry);
        Ok(())
    }

    fn delete(&self, id: &SecretId) -> Result<bool, StoreError> {
        Ok(self.with_live(id, |entries| entries.remove(id).is_some()))
    }

    fn status(&self, id: &SecretId) -> Result<bool, StoreError> {
        self.with_live(id, |entries| {
            entries.get(id).map(|entry| entry.secret.one_time).ok_or(StoreError::NotFound)
        })
    }

    #[allow(clippy::expect_used)]
    fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock().expect("Mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use vanish_proto::Expiration;

    use super::*;
    use crate::env::test_env::TestEnv;

    fn id(n: u8) -> SecretId {
        SecretId::from_random_bytes([n; 16])
    }

    #[test]
    fn put_get_delete() {
        let store = MemoryStore::new(TestEnv::default());
        let secret = Secret::new("hello", Expiration::OneHour, false);

        store.put(&id(1), &secret).unwrap();
        assert_eq!(store.get(&id(1)).unwrap(), secret);
        assert!(!store.status(&id(1)).unwrap());

        assert!(store.delete(&id(1)).unwrap());
        assert!(!store.delete(&id(1)).unwrap(), "second delete reports absence");
        assert_eq!(store.get(&id(1)), Err(StoreError::NotFound));
        assert_eq!(store.status(&id(1)), Err(StoreError::NotFound));
    }

    #[test]
    fn entries_expire_at_ttl() {
        let env = TestEnv::default();
        let store = MemoryStore::new(env.clone());
        store.put(&id(1), &Secret::new("hello", Expiration::OneHour, true)).unwrap();

        env.advance(Duration::from_secs(3599));
        assert!(store.status(&id(1)).unwrap());

        env.advance(Duration::from_secs(1));
        assert_eq!(store.get(&id(1)), Err(StoreError::NotFound));
        assert!(!store.delete(&id(1)).unwrap());
        assert!(store.is_empty(), "expired entry is dropped on access");
    }

    #[test]
    fn purge_removes_only_expired() {
        let env = TestEnv::default();
        let store = MemoryStore::new(env.clone());
        store.put(&id(1), &Secret::new("a", Expiration::OneHour, false)).unwrap();
        store.put(&id(2), &Secret::new("b", Expiration::OneDay, false)).unwrap();

        env.advance(Duration::from_secs(7200));
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&id(2)).is_ok());
    }

    #[test]
    fn non_positive_expiration_is_rejected() {
        let store = MemoryStore::new(TestEnv::default());
        let secret = Secret { expiration: 0, message: "m".to_string(), one_time: false };
        assert_eq!(store.put(&id(1), &secret), Err(StoreError::InvalidExpiration(0)));
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new(TestEnv::default());
        let clone = store.clone();
        store.put(&id(9), &Secret::new("x", Expiration::OneWeek, false)).unwrap();
        assert!(clone.get(&id(9)).is_ok());
    }
}
