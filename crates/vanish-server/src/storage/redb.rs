//! Redb-backed durable secret store.
//!
//! Uses Redb's ACID transactions so stored secrets survive a restart. Each
//! value carries an absolute wall-clock deadline; reads treat anything past
//! it as absent and the sweeper removes it later.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use vanish_core::{Environment, SecretStore, StoreError, store::ttl};
use vanish_proto::{Secret, SecretId};

/// Table: secrets
/// Key: secret id as its 16 uuid bytes
/// Value: deadline (8 bytes BE, Unix seconds) + JSON-encoded secret
const SECRETS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("secrets");

const DEADLINE_SIZE: usize = 8;

/// Durable store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore<E: Environment> {
    db: Arc<Database>,
    env: E,
}

impl<E: Environment> RedbStore<E> {
    /// Open or create a Redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>, env: E) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| StoreError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db), env })
    }

    /// Number of stored entries, expired ones included.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the table cannot be read.
    pub fn len(&self) -> Result<u64, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;
        table.len().map_err(|e| StoreError::Io(e.to_string()))
    }

    /// Returns true if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the table cannot be read.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn load(&self, id: &SecretId) -> Result<Secret, StoreError> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Io(e.to_string()))?;
        let table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

        let value = table
            .get(id.as_uuid().as_bytes().as_slice())
            .map_err(|e| StoreError::Io(e.to_string()))?
            .ok_or(StoreError::NotFound)?;

        let (deadline, secret) = decode_value(value.value())?;
        if self.is_expired(deadline) {
            return Err(StoreError::NotFound);
        }
        Ok(secret)
    }

    fn is_expired(&self, deadline: u64) -> bool {
        self.env.wall_clock_secs() >= deadline
    }
}

impl<E: Environment> SecretStore for RedbStore<E> {
    fn get(&self, id: &SecretId) -> Result<Secret, StoreError> {
        self.load(id)
    }

    fn put(&self, id: &SecretId, secret: &Secret) -> Result<(), StoreError> {
        let deadline = self.env.wall_clock_secs().saturating_add(ttl(secret)?.as_secs());
        let value = encode_value(deadline, secret)?;

        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;
            table
                .insert(id.as_uuid().as_bytes().as_slice(), value.as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    fn delete(&self, id: &SecretId) -> Result<bool, StoreError> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        let existed = {
            let mut table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;
            let removed = table
                .remove(id.as_uuid().as_bytes().as_slice())
                .map_err(|e| StoreError::Io(e.to_string()))?;

            match removed {
                Some(value) => {
                    let deadline = decode_deadline(value.value())?;
                    !self.is_expired(deadline)
                },
                None => false,
            }
        };
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(existed)
    }

    fn status(&self, id: &SecretId) -> Result<bool, StoreError> {
        self.load(id).map(|secret| secret.one_time)
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.env.wall_clock_secs();

        let txn = self.db.begin_write().map_err(|e| StoreError::Io(e.to_string()))?;
        let purged = {
            let mut table = txn.open_table(SECRETS).map_err(|e| StoreError::Io(e.to_string()))?;

            let mut expired = Vec::new();
            for entry in table.iter().map_err(|e| StoreError::Io(e.to_string()))? {
                let (key, value) = entry.map_err(|e| StoreError::Io(e.to_string()))?;
                if now >= decode_deadline(value.value())? {
                    expired.push(key.value().to_vec());
                }
            }

            for key in &expired {
                table.remove(key.as_slice()).map_err(|e| StoreError::Io(e.to_string()))?;
            }
            expired.len()
        };
        txn.commit().map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(purged)
    }
}

fn encode_value(deadline: u64, secret: &Secret) -> Result<Vec<u8>, StoreError> {
    let json = secret.to_json()?;
    let mut value = Vec::with_capacity(DEADLINE_SIZE + json.len());
    value.extend_from_slice(&deadline.to_be_bytes());
    value.extend_from_slice(&json);
    Ok(value)
}

fn decode_deadline(value: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; DEADLINE_SIZE] = value
        .get(..DEADLINE_SIZE)
        .and_then(|prefix| prefix.try_into().ok())
        .ok_or_else(|| StoreError::Serialization("stored value shorter than deadline".into()))?;
    Ok(u64::from_be_bytes(bytes))
}

fn decode_value(value: &[u8]) -> Result<(u64, Secret), StoreError> {
    let deadline = decode_deadline(value)?;
    let secret = Secret::from_json(&value[DEADLINE_SIZE..])?;
    Ok((deadline, secret))
}
