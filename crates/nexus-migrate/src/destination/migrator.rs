//! Backend-agnostic migration writer.

use async_trait::async_trait;
use nexus_schema::{encode, Character, User};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{DestinationKind, MigrationOptions};
use crate::destination::{Backend, Migrate, Namespace};
use crate::error::{Error, Result};
use crate::pipeline::{self, MigrationStats, Progress};
use crate::prepare::prepare_files;
use crate::source::{PlayerSource, SqliteSource};

/// Lifecycle of the destination handle.
enum WriterState<B> {
    Unopened,
    Open(Arc<B>),
    Closed,
}

impl<B> WriterState<B> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Open(_) => "open",
            Self::Closed => "closed",
        }
    }
}

/// Writes migrated documents into a `B` store.
///
/// Writes are only accepted between [`Migrator::open`] and
/// [`Migrator::close`]; anything else fails with [`Error::NotInitialized`].
pub struct Migrator<B: Backend> {
    state: WriterState<B>,
    options: MigrationOptions,
}

impl<B: Backend> Migrator<B> {
    /// Creates an unopened writer.
    #[must_use]
    pub fn new(options: MigrationOptions) -> Self {
        Self {
            state: WriterState::Unopened,
            options,
        }
    }

    /// Name of the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> &'static str {
        self.state.name()
    }

    /// Opens the destination store at `dest` on the blocking pool, waiting
    /// out lock contention for up to the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DestOpenFailed`] if the store cannot be opened or the
    /// writer was already opened once.
    pub async fn open(&mut self, dest: &Path) -> Result<()> {
        if !matches!(self.state, WriterState::Unopened) {
            return Err(Error::DestOpenFailed(format!(
                "writer is already {}",
                self.state.name()
            )));
        }

        let dest = dest.to_path_buf();
        let timeout = self.options.open_timeout();
        let store = tokio::task::spawn_blocking(move || B::open(&dest, timeout))
            .await
            .map_err(|e| Error::DestOpenFailed(format!("open task failed: {e}")))??;

        self.state = WriterState::Open(Arc::new(store));
        Ok(())
    }

    /// Closes the destination store. Closing a writer that is not open is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if the store fails to flush or a write
    /// is still in flight.
    pub async fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, WriterState::Closed) {
            WriterState::Open(store) => {
                let store = Arc::try_unwrap(store)
                    .map_err(|_| Error::WriteFailed("store is still in use".to_string()))?;
                blocking(move || store.close()).await
            }
            WriterState::Unopened => {
                self.state = WriterState::Unopened;
                Ok(())
            }
            WriterState::Closed => Ok(()),
        }
    }

    /// The open store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] unless the writer is open.
    pub fn store(&self) -> Result<&B> {
        match &self.state {
            WriterState::Open(store) => Ok(&**store),
            other => Err(Error::NotInitialized(other.name())),
        }
    }

    fn shared_store(&self) -> Result<Arc<B>> {
        match &self.state {
            WriterState::Open(store) => Ok(Arc::clone(store)),
            other => Err(Error::NotInitialized(other.name())),
        }
    }

    async fn import(&self, working: &Path) -> Result<MigrationStats> {
        info!("Opening SQLite file");
        let source = SqliteSource::open(working).await?;
        let progress = Progress::new(self.options.quiet);

        let result = pipeline::import_players(&source, self, &progress).await;

        progress.finish();
        source.close().await;
        result
    }
}

#[async_trait]
impl<B: Backend> Migrate for Migrator<B> {
    fn kind(&self) -> DestinationKind {
        B::KIND
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let store = self.shared_store()?;
        let bytes =
            encode(user).map_err(|e| Error::EncodeFailed(format!("user {}: {e}", user.id)))?;
        let key = user.id.clone();
        blocking(move || store.put(Namespace::Users, &key, &bytes)).await
    }

    async fn insert_char(&self, character: &Character) -> Result<()> {
        let store = self.shared_store()?;
        let bytes = encode(character)
            .map_err(|e| Error::EncodeFailed(format!("character {}: {e}", character.id)))?;
        let key = character.id.hyphenated().to_string();
        blocking(move || store.put(Namespace::Characters, &key, &bytes)).await
    }

    async fn migrate(&mut self, origin: &Path, dest: &Path) -> Result<MigrationStats> {
        let start = Instant::now();

        let prepared = prepare_files(origin, &self.options.scratch_path).await?;

        info!("Opening connection to new database");
        self.open(dest).await?;
        debug!("Destination {} ready ({})", dest.display(), B::KIND);

        let imported = self.import(&prepared.working).await;
        let closed = self.close().await;

        let mut stats = imported?;
        closed?;
        stats.duration_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }
}

/// Runs a synchronous store call on the blocking pool.
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::WriteFailed(format!("store task failed: {e}")))?
}
