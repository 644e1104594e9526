//! Log-structured destination (`--destdb badger`).
//!
//! All documents share one keyspace; namespaces are key prefixes.

use sled::transaction::{TransactionError, TransactionResult};
use sled::Db;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::DestinationKind;
use crate::destination::{open_with_lock_timeout, Backend, Namespace};
use crate::error::{Error, Result};

const USERS_PREFIX: &str = "users:";
const CHARACTERS_PREFIX: &str = "characters:";

const fn prefix(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Users => USERS_PREFIX,
        Namespace::Characters => CHARACTERS_PREFIX,
    }
}

fn namespaced(namespace: Namespace, key: &str) -> Vec<u8> {
    [prefix(namespace).as_bytes(), key.as_bytes()].concat()
}

fn is_lock_contention(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(io) => {
            io.kind() == std::io::ErrorKind::WouldBlock
                || io.to_string().contains("could not acquire")
        }
        _ => false,
    }
}

/// Prefix-namespaced log-structured store.
pub struct BadgerStore {
    db: Db,
}

impl Backend for BadgerStore {
    const KIND: DestinationKind = DestinationKind::Badger;

    fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let db = open_with_lock_timeout(
            timeout,
            || sled::Config::new().path(path).open(),
            is_lock_contention,
        )
        .map_err(|e| {
            Error::DestOpenFailed(format!(
                "unable to open badger store '{}': {e}",
                path.display()
            ))
        })?;

        debug!("Opened badger store {}", path.display());
        Ok(Self { db })
    }

    fn put(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<()> {
        let full_key = namespaced(namespace, key);

        let committed: TransactionResult<()> = self.db.transaction(|tx| {
            tx.insert(full_key.as_slice(), value)?;
            Ok(())
        });
        match committed {
            Ok(()) => {}
            Err(TransactionError::Storage(e)) => {
                return Err(Error::WriteFailed(format!(
                    "badger: failed to put in {}: {e}",
                    namespace.as_str()
                )))
            }
            Err(TransactionError::Abort(())) => {
                return Err(Error::WriteFailed(format!(
                    "badger: transaction on {} aborted",
                    namespace.as_str()
                )))
            }
        }

        self.db.flush().map_err(|e| {
            Error::WriteFailed(format!("badger: failed to sync {}: {e}", namespace.as_str()))
        })?;
        Ok(())
    }

    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.db.get(namespaced(namespace, key)).map_err(|e| {
            Error::ReadFailed(format!("badger: failed to read {}: {e}", namespace.as_str()))
        })?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn count(&self, namespace: Namespace) -> Result<usize> {
        let mut count = 0;
        for entry in self.db.scan_prefix(prefix(namespace)) {
            entry.map_err(|e| {
                Error::ReadFailed(format!("badger: failed to scan {}: {e}", namespace.as_str()))
            })?;
            count += 1;
        }
        Ok(count)
    }

    fn close(self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::WriteFailed(format!("badger: failed to flush on close: {e}")))?;
        Ok(())
    }
}
