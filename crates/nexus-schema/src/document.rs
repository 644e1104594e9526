//! User and character documents.
//!
//! Field names are serialized fully lower-cased (`steamid`, `createdat`,
//! `deletedcharacters`) to stay readable by the Nexus server. Timestamps are
//! stored as BSON datetimes, so they keep millisecond precision.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::format;

/// Number of character slots a user owns. Slots are numbered `1..=MAX_SLOTS`.
pub const MAX_SLOTS: u8 = 3;

/// A player account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier (`SteamID`).
    pub id: String,
    /// Live characters by slot.
    #[serde(with = "format::slot_map")]
    pub characters: BTreeMap<u8, Uuid>,
    /// Soft-deleted characters by slot.
    #[serde(rename = "deletedcharacters", with = "format::slot_map")]
    pub deleted_characters: BTreeMap<u8, Uuid>,
}

impl User {
    /// Creates a user with no characters.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            characters: BTreeMap::new(),
            deleted_characters: BTreeMap::new(),
        }
    }
}

/// A character save owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character identifier.
    #[serde(with = "format::uuid_string")]
    pub id: Uuid,
    /// Owning account identifier.
    #[serde(rename = "steamid")]
    pub steam_id: String,
    /// Slot number, `1..=MAX_SLOTS`.
    pub slot: u8,
    /// When the character was first created.
    #[serde(rename = "createdat", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Save payload.
    pub data: CharacterData,
}

/// Character save payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterData {
    /// When this payload was written.
    #[serde(rename = "createdat", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Payload size as reported by the game server.
    pub size: i64,
    /// Encoded save data.
    pub data: String,
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
