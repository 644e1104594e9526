//! Legacy SQLite source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::source::{LegacyCharacter, LegacyPlayer, PlayerSource, ELIGIBLE_VERSION};

/// One connection streams players while the other serves slot lookups.
const POOL_CONNECTIONS: u32 = 2;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

const PLAYERS_QUERY: &str = "SELECT id, steamid, created_at FROM players";

/// Player ids may be stored as UUID text in any case or as a raw 16-byte blob.
const CHARACTER_QUERY: &str = "SELECT id, player_id, version, slot, size, data, created_at \
     FROM characters WHERE (lower(player_id) = ? OR player_id = ?) AND version = ? AND slot = ?";

const INELIGIBLE_QUERY: &str = "SELECT COUNT(*) FROM characters WHERE version <> ?";

/// Read-only reader over a legacy SQLite database.
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    /// Opens `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceQueryFailed`] if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::SourceQueryFailed(format!("unable to open '{}': {e}", path.display()))
            })?;

        debug!("Opened SQLite source {}", path.display());
        Ok(Self { pool })
    }
}

#[async_trait]
impl PlayerSource for SqliteSource {
    fn list_players(&self) -> BoxStream<'_, Result<LegacyPlayer>> {
        sqlx::query(PLAYERS_QUERY)
            .fetch(&self.pool)
            .map(|row| {
                let row = row.map_err(|e| {
                    Error::SourceQueryFailed(format!("unable to query players: {e}"))
                })?;
                decode_player(&row)
            })
            .boxed()
    }

    async fn find_character(&self, player_id: &Uuid, slot: u8) -> Result<Option<LegacyCharacter>> {
        let row = sqlx::query(CHARACTER_QUERY)
            .bind(player_id.hyphenated().to_string())
            .bind(player_id.as_bytes().to_vec())
            .bind(ELIGIBLE_VERSION)
            .bind(i64::from(slot))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::SourceQueryFailed(format!(
                    "unable to query character slot {slot} of player {player_id}: {e}"
                ))
            })?;

        row.as_ref().map(decode_character).transpose()
    }

    async fn count_ineligible_characters(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(INELIGIBLE_QUERY)
            .bind(ELIGIBLE_VERSION)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::SourceQueryFailed(format!("unable to count characters: {e}")))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_player(row: &SqliteRow) -> Result<LegacyPlayer> {
    let scan = |reason: String| Error::RowScanFailed {
        table: "players",
        reason,
    };

    Ok(LegacyPlayer {
        id: decode_uuid(row, "id").map_err(scan)?,
        steam_id: decode_account(row, "steamid").map_err(scan)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| scan(e.to_string()))?,
    })
}

fn decode_character(row: &SqliteRow) -> Result<LegacyCharacter> {
    let scan = |reason: String| Error::RowScanFailed {
        table: "characters",
        reason,
    };

    let slot: i64 = row.try_get("slot").map_err(|e| scan(e.to_string()))?;
    let slot = u8::try_from(slot).map_err(|_| scan(format!("slot {slot} out of range")))?;

    let data: Option<Vec<u8>> = row.try_get("data").map_err(|e| scan(e.to_string()))?;
    let data = String::from_utf8(data.unwrap_or_default())
        .map_err(|e| scan(format!("payload is not UTF-8: {e}")))?;

    Ok(LegacyCharacter {
        id: decode_uuid(row, "id").map_err(scan)?,
        player_id: decode_uuid(row, "player_id").map_err(scan)?,
        version: row.try_get("version").map_err(|e| scan(e.to_string()))?,
        slot,
        size: row.try_get("size").map_err(|e| scan(e.to_string()))?,
        data,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| scan(e.to_string()))?,
    })
}

/// Accepts canonical UUID text or a raw 16-byte blob.
fn decode_uuid(row: &SqliteRow, column: &str) -> std::result::Result<Uuid, String> {
    let raw: Vec<u8> = row
        .try_get(column)
        .map_err(|e| format!("{column}: {e}"))?;

    if raw.len() == 16 {
        return Uuid::from_slice(&raw).map_err(|e| format!("{column}: {e}"));
    }

    let text = std::str::from_utf8(&raw).map_err(|e| format!("{column}: {e}"))?;
    Uuid::parse_str(text.trim()).map_err(|e| format!("{column} '{text}': {e}"))
}

/// Account ids may be stored as text or as a bare integer; NULL reads as empty.
fn decode_account(row: &SqliteRow, column: &str) -> std::result::Result<String, String> {
    match row.try_get::<Option<String>, _>(column) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(text_err) => row
            .try_get::<Option<i64>, _>(column)
            .map(|value| value.map(|v| v.to_string()).unwrap_or_default())
            .map_err(|_| format!("{column}: {text_err}")),
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
