// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # Nexus Migration Tool
//!
//! `nexus-migrate` is a CLI tool and library that moves player and character
//! records out of the legacy Nexus SQLite database and into an embedded
//! key-value store.
//!
//! ## Destinations
//!
//! | `--destdb` | Engine | Namespacing |
//! |------------|--------|-------------|
//! | `bbolt` (default) | single-file B-tree | one table per namespace |
//! | `badger` | log-structured | key prefixes |
//!
//! ## Safety
//!
//! The origin file is never modified or deleted. It is copied to
//! `<origin>.bak` and moved to a scratch path before it is read, so a failed
//! run can always be repeated from the backup against a fresh destination.
//!
//! ## Quick Start
//!
//! ```bash
//! nexus-migrate --origindbfile ./runtime/database.db --destdbfile ./runtime/nexus.db
//!
//! # Badger-style destination, settings from a file
//! nexus-migrate --config migration.yaml --destdb badger
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! source:
//!   type: sqlite
//!   path: ./runtime/database.db
//!
//! destination:
//!   type: bbolt
//!   path: ./runtime/nexus.db
//!
//! options:
//!   scratch_path: ./runtime/old_database.db
//!   open_timeout_secs: 15
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod destination;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod prepare;
pub mod source;

pub use config::{DestinationKind, MigrationConfig, MigrationOptions, SourceConfig};
pub use destination::{create_migrator, Backend, BadgerStore, BoltStore, Migrate, Migrator, Namespace};
pub use error::{Error, Result};
pub use pipeline::{MigrationStats, Progress};
pub use source::{LegacyCharacter, LegacyPlayer, PlayerSource, SqliteSource};
