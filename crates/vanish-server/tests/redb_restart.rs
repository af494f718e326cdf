//! Durability of the Redb store across restarts
//!
//! 1. **Persistence**: secrets written before a reopen are readable after it
//! 2. **One-time**: a consumed secret stays consumed after a reopen
//! 3. **Deadlines**: expiry is wall-clock based, so it survives a reopen

use tempfile::tempdir;
use vanish_core::{Environment as _, Policy, SecretService, SecretStore, ServiceError};
use vanish_harness::SimEnv;
use vanish_proto::{Expiration, Secret};
use vanish_server::RedbStore;

fn secret(one_time: bool) -> Secret {
    Secret::new("-----BEGIN PGP MESSAGE-----", Expiration::OneDay, one_time)
}

#[test]
fn secrets_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vanish.redb");
    let env = SimEnv::with_seed(11);

    let (kept, consumed) = {
        let store = RedbStore::open(&path, env.clone()).unwrap();
        let service = SecretService::new(store, env.clone(), Policy::default());
        let kept = service.create_secret(&secret(false)).unwrap();
        let consumed = service.create_secret(&secret(true)).unwrap();
        service.retrieve_secret(&consumed).unwrap();
        (kept, consumed)
    };

    {
        let store = RedbStore::open(&path, env.clone()).unwrap();
        let service = SecretService::new(store.clone(), env.clone(), Policy::default());

        assert_eq!(service.retrieve_secret(&kept).unwrap(), secret(false));
        assert_eq!(service.retrieve_secret(&consumed), Err(ServiceError::NotFound));
        assert_eq!(store.len().unwrap(), 1);
    }
}

#[test]
fn expiry_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vanish.redb");
    let env = SimEnv::with_seed(12);

    let id = {
        let store = RedbStore::open(&path, env.clone()).unwrap();
        let id = env.secret_id();
        store.put(&id, &secret(false)).unwrap();
        id
    };

    env.advance(Expiration::OneDay.duration());

    let store = RedbStore::open(&path, env.clone()).unwrap();
    assert!(store.get(&id).unwrap_err().is_not_found());
    assert_eq!(store.purge_expired().unwrap(), 1);
    assert!(store.is_empty().unwrap());
}
