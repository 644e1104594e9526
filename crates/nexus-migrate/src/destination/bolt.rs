//! Single-file B-tree destination (`--destdb bbolt`).
//!
//! Each namespace is its own table ("bucket"), created when the store opens.

use redb::{Database, DatabaseError, ReadableTable, TableDefinition};
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::DestinationKind;
use crate::destination::{open_with_lock_timeout, Backend, Namespace};
use crate::error::{Error, Result};

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const CHARACTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("characters");

const fn table(namespace: Namespace) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match namespace {
        Namespace::Users => USERS,
        Namespace::Characters => CHARACTERS,
    }
}

fn write_failed(namespace: Namespace) -> impl Fn(&dyn Display) -> Error {
    move |e| Error::WriteFailed(format!("bbolt: failed to put in {}: {e}", namespace.as_str()))
}

fn read_failed(namespace: Namespace) -> impl Fn(&dyn Display) -> Error {
    move |e| Error::ReadFailed(format!("bbolt: failed to read {}: {e}", namespace.as_str()))
}

/// Bucketed single-file store.
pub struct BoltStore {
    db: Database,
}

impl BoltStore {
    fn create_buckets(db: &Database) -> Result<()> {
        let open_failed = |e: &dyn Display| {
            Error::DestOpenFailed(format!("unable to create buckets: {e}"))
        };

        let txn = db.begin_write().map_err(|e| open_failed(&e))?;
        for namespace in Namespace::ALL {
            txn.open_table(table(namespace))
                .map_err(|e| open_failed(&e))?;
        }
        txn.commit().map_err(|e| open_failed(&e))
    }
}

impl Backend for BoltStore {
    const KIND: DestinationKind = DestinationKind::Bbolt;

    fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let db = open_with_lock_timeout(
            timeout,
            || Database::create(path),
            |e| matches!(e, DatabaseError::DatabaseAlreadyOpen),
        )
        .map_err(|e| {
            Error::DestOpenFailed(format!("unable to open bbolt store '{}': {e}", path.display()))
        })?;

        Self::create_buckets(&db)?;
        debug!("Opened bbolt store {}", path.display());
        Ok(Self { db })
    }

    fn put(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<()> {
        let failed = write_failed(namespace);

        let txn = self.db.begin_write().map_err(|e| failed(&e))?;
        {
            let mut bucket = txn.open_table(table(namespace)).map_err(|e| failed(&e))?;
            bucket.insert(key, value).map_err(|e| failed(&e))?;
        }
        txn.commit().map_err(|e| failed(&e))
    }

    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>> {
        let failed = read_failed(namespace);

        let txn = self.db.begin_read().map_err(|e| failed(&e))?;
        let bucket = txn.open_table(table(namespace)).map_err(|e| failed(&e))?;
        let value = bucket.get(key).map_err(|e| failed(&e))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn count(&self, namespace: Namespace) -> Result<usize> {
        let failed = read_failed(namespace);

        let txn = self.db.begin_read().map_err(|e| failed(&e))?;
        let bucket = txn.open_table(table(namespace)).map_err(|e| failed(&e))?;
        let mut count = 0;
        for entry in bucket.iter().map_err(|e| failed(&e))? {
            entry.map_err(|e| failed(&e))?;
            count += 1;
        }
        Ok(count)
    }

    fn close(self) -> Result<()> {
        // Every put commits durably; dropping releases the file lock.
        drop(self.db);
        Ok(())
    }
}
