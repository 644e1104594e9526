//! Legacy database fixtures shared by the integration tests.

#![allow(dead_code)]

use nexus_migrate::{DestinationKind, MigrationOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCHEMA: [&str; 2] = [
    "CREATE TABLE players (id TEXT PRIMARY KEY, steamid TEXT, created_at DATETIME NOT NULL)",
    "CREATE TABLE characters (id TEXT PRIMARY KEY, player_id TEXT NOT NULL, version INTEGER NOT NULL, \
     slot INTEGER NOT NULL, size INTEGER NOT NULL, data BLOB, created_at DATETIME NOT NULL)",
];

/// A legacy player row.
pub struct Player<'a> {
    pub id: &'a str,
    pub steam_id: &'a str,
}

/// A legacy character row.
pub struct Char<'a> {
    pub id: &'a str,
    pub player_id: &'a str,
    pub version: i64,
    pub slot: i64,
    pub data: &'a str,
}

/// Paths used by one migration run, all inside a temp directory.
pub struct Workspace {
    pub dir: TempDir,
    pub origin: PathBuf,
    pub dest: PathBuf,
    pub scratch: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let origin = dir.path().join("database.db");
        let dest = dir.path().join("nexus.db");
        let scratch = dir.path().join("runtime").join("old_database.db");
        Self {
            dir,
            origin,
            dest,
            scratch,
        }
    }

    pub fn options(&self) -> MigrationOptions {
        MigrationOptions {
            scratch_path: self.scratch.clone(),
            open_timeout_secs: 1,
            quiet: true,
        }
    }

    pub fn backup(&self) -> PathBuf {
        self.dir.path().join("database.db.bak")
    }
}

/// Writes a legacy database with the given rows to `path`.
pub async fn write_legacy_db(path: &Path, players: &[Player<'_>], chars: &[Char<'_>]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();

    for sql in SCHEMA {
        sqlx::query(sql).execute(&mut conn).await.unwrap();
    }
    for player in players {
        sqlx::query("INSERT INTO players (id, steamid, created_at) VALUES (?, ?, ?)")
            .bind(player.id)
            .bind(player.steam_id)
            .bind("2021-06-01T12:00:00Z")
            .execute(&mut conn)
            .await
            .unwrap();
    }
    for ch in chars {
        sqlx::query(
            "INSERT INTO characters (id, player_id, version, slot, size, data, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(ch.id)
        .bind(ch.player_id)
        .bind(ch.version)
        .bind(ch.slot)
        .bind(ch.data.len() as i64)
        .bind(ch.data)
        .bind("2021-07-04T09:15:00Z")
        .execute(&mut conn)
        .await
        .unwrap();
    }

    conn.close().await.unwrap();
}

pub const ALL_BACKENDS: [DestinationKind; 2] = [DestinationKind::Bbolt, DestinationKind::Badger];
