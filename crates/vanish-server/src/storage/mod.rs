//! Durable secret storage.

mod redb;

pub use self::redb::RedbStore;
