//! Legacy record sources.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::Result;

pub use sqlite::SqliteSource;

/// Number of character slots in the legacy schema (`0..LEGACY_SLOTS`).
pub const LEGACY_SLOTS: u8 = 3;

/// Only character rows with this version are migrated.
pub const ELIGIBLE_VERSION: i64 = 1;

/// A row of the legacy `players` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPlayer {
    /// Row identifier.
    pub id: Uuid,
    /// Account identifier. Empty means the player is not migrated.
    pub steam_id: String,
    /// When the player was first seen.
    pub created_at: DateTime<Utc>,
}

/// A row of the legacy `characters` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCharacter {
    /// Row identifier, reused as the destination character id.
    pub id: Uuid,
    /// Owning player row.
    pub player_id: Uuid,
    /// Save format version.
    pub version: i64,
    /// Zero-based slot index.
    pub slot: u8,
    /// Payload size.
    pub size: i64,
    /// Encoded save payload.
    pub data: String,
    /// When the character was created.
    pub created_at: DateTime<Utc>,
}

/// Trait for legacy record sources.
///
/// A missing character is `Ok(None)`; errors are reserved for failed queries
/// and malformed rows.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    /// Streams every player in the source's natural row order.
    fn list_players(&self) -> BoxStream<'_, Result<LegacyPlayer>>;

    /// Looks up the eligible character in `slot` (zero-based) for a player.
    async fn find_character(&self, player_id: &Uuid, slot: u8) -> Result<Option<LegacyCharacter>>;

    /// Counts character rows excluded by the version gate.
    async fn count_ineligible_characters(&self) -> Result<u64>;

    /// Releases the connection.
    async fn close(&self);
}
