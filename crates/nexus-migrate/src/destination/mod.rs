//! Destination stores.
//!
//! A [`Backend`] is an ordered key-value store with two isolated namespaces
//! and one atomic, durable transaction per write. [`Migrator`] layers the
//! document encoding, the open/closed lifecycle and the full migration run on
//! top of any backend.

pub mod badger;
pub mod bolt;
pub mod migrator;

use async_trait::async_trait;
use nexus_schema::{Character, User};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::{DestinationKind, MigrationOptions};
use crate::error::Result;
use crate::pipeline::MigrationStats;

pub use badger::BadgerStore;
pub use bolt::BoltStore;
pub use migrator::Migrator;

/// Delay between attempts to take a store's file lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Logical partition of the destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// User documents keyed by account id.
    Users,
    /// Character documents keyed by character UUID.
    Characters,
}

impl Namespace {
    /// All namespaces a store must provide.
    pub const ALL: [Self; 2] = [Self::Users, Self::Characters];

    /// Namespace name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Characters => "characters",
        }
    }
}

/// An embedded ordered key-value store.
pub trait Backend: Sized + Send + Sync + 'static {
    /// Which `--destdb` value selects this backend.
    const KIND: DestinationKind;

    /// Opens or creates the store at `path` and makes sure every namespace
    /// exists. Waits up to `timeout` for another process to release the
    /// store's lock.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DestOpenFailed`] on failure.
    fn open(path: &Path, timeout: Duration) -> Result<Self>;

    /// Upserts `value` under `key` in one committed transaction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if the transaction does not commit.
    fn put(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<()>;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] if the store cannot be read.
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>>;

    /// Counts the keys in a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] if the store cannot be read.
    fn count(&self, namespace: Namespace) -> Result<usize>;

    /// Flushes and releases the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if pending data cannot be flushed.
    fn close(self) -> Result<()>;
}

/// Writer for migrated documents.
#[async_trait]
pub trait Migrate: Send + Sync {
    /// Which backend this writer targets.
    fn kind(&self) -> DestinationKind;

    /// Stores a user under its account id, replacing any previous value.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotInitialized`], [`crate::Error::EncodeFailed`] or
    /// [`crate::Error::WriteFailed`].
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Stores a character under its UUID, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Same as [`Migrate::insert_user`].
    async fn insert_char(&self, character: &Character) -> Result<()>;

    /// Runs a complete migration from `origin` into a new store at `dest`.
    ///
    /// Stops at the first error. Documents written before the error stay in
    /// the destination; the origin can be restored from `<origin>.bak`.
    ///
    /// # Errors
    ///
    /// Any [`crate::Error`] raised while preparing, reading or writing.
    async fn migrate(&mut self, origin: &Path, dest: &Path) -> Result<MigrationStats>;
}

/// Create a writer for the selected backend.
#[must_use]
pub fn create_migrator(kind: DestinationKind, options: MigrationOptions) -> Box<dyn Migrate> {
    match kind {
        DestinationKind::Bbolt => Box::new(Migrator::<BoltStore>::new(options)),
        DestinationKind::Badger => Box::new(Migrator::<BadgerStore>::new(options)),
    }
}

/// Calls `open` until it succeeds, fails for a reason other than lock
/// contention, or `timeout` elapses. Sleeps the calling thread between
/// attempts, so async callers run it on the blocking pool.
pub(crate) fn open_with_lock_timeout<T, E>(
    timeout: Duration,
    mut open: impl FnMut() -> std::result::Result<T, E>,
    is_locked: impl Fn(&E) -> bool,
) -> std::result::Result<T, E> {
    let deadline = Instant::now() + timeout;
    loop {
        match open() {
            Err(e) if is_locked(&e) && Instant::now() < deadline => {
                debug!("Destination store is locked, retrying");
                std::thread::sleep(LOCK_POLL_INTERVAL);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
