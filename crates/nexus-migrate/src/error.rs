//! Error types for `nexus-migrate`.
//!
//! Every error is fatal to a migration run: the first one stops the import
//! and is reported to the operator. Codes follow the pattern `MIGRATE-XXX`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a migration.
#[derive(Error, Debug)]
pub enum Error {
    /// Origin database file does not exist (MIGRATE-001).
    #[error("[MIGRATE-001] Origin database file '{}' doesn't exist", .0.display())]
    SourceNotFound(PathBuf),

    /// The `.bak` safety copy could not be written (MIGRATE-002).
    #[error("[MIGRATE-002] Failed to back up '{}': {reason}", .path.display())]
    BackupFailed {
        /// Backup file that was being written.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// The origin file could not be moved to the scratch location (MIGRATE-003).
    #[error("[MIGRATE-003] Failed to move origin database to '{}': {reason}", .path.display())]
    PrepareFailed {
        /// Scratch location the file was being moved to.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// Destination store could not be opened or initialized (MIGRATE-004).
    #[error("[MIGRATE-004] Unable to open destination database: {0}")]
    DestOpenFailed(String),

    /// Source connection or query failed (MIGRATE-005).
    #[error("[MIGRATE-005] Source query failed: {0}")]
    SourceQueryFailed(String),

    /// A source row had an unexpected shape (MIGRATE-006).
    #[error("[MIGRATE-006] Unable to scan {table} row: {reason}")]
    RowScanFailed {
        /// Table the row came from.
        table: &'static str,
        /// Underlying failure.
        reason: String,
    },

    /// A document could not be encoded (MIGRATE-007).
    #[error("[MIGRATE-007] Failed to encode {0}")]
    EncodeFailed(String),

    /// A destination transaction failed to commit (MIGRATE-008).
    #[error("[MIGRATE-008] Failed to write to destination: {0}")]
    WriteFailed(String),

    /// A write was attempted while the destination store is not open (MIGRATE-009).
    #[error("[MIGRATE-009] Destination database is not open (state: {0})")]
    NotInitialized(&'static str),

    /// Invalid configuration (MIGRATE-010).
    #[error("[MIGRATE-010] Configuration error: {0}")]
    Config(String),

    /// Reading back from the destination failed (MIGRATE-011).
    #[error("[MIGRATE-011] Failed to read from destination: {0}")]
    ReadFailed(String),
}

impl Error {
    /// Returns the error code (e.g., "MIGRATE-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "MIGRATE-001",
            Self::BackupFailed { .. } => "MIGRATE-002",
            Self::PrepareFailed { .. } => "MIGRATE-003",
            Self::DestOpenFailed(_) => "MIGRATE-004",
            Self::SourceQueryFailed(_) => "MIGRATE-005",
            Self::RowScanFailed { .. } => "MIGRATE-006",
            Self::EncodeFailed(_) => "MIGRATE-007",
            Self::WriteFailed(_) => "MIGRATE-008",
            Self::NotInitialized(_) => "MIGRATE-009",
            Self::Config(_) => "MIGRATE-010",
            Self::ReadFailed(_) => "MIGRATE-011",
        }
    }

    /// Returns true if the source database has already been moved to the
    /// scratch location when this error occurs.
    ///
    /// Operators recover from these by restoring the `.bak` copy.
    #[must_use]
    pub const fn origin_relocated(&self) -> bool {
        !matches!(
            self,
            Self::SourceNotFound(_)
                | Self::BackupFailed { .. }
                | Self::PrepareFailed { .. }
                | Self::Config(_)
        )
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
