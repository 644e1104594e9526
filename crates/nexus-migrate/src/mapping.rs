//! Legacy row to destination document mapping.
//!
//! This is the only place that knows how the old schema lines up with the new
//! one: zero-based legacy slots become one-based slots, and the character's
//! timestamp and size are copied into the embedded payload record.

use nexus_schema::{Character, CharacterData, User};

use crate::source::{LegacyCharacter, LegacyPlayer, LEGACY_SLOTS};

/// Maps a zero-based legacy slot to its one-based destination slot.
#[must_use]
pub fn destination_slot(legacy_slot: u8) -> Option<u8> {
    (legacy_slot < LEGACY_SLOTS).then(|| legacy_slot + 1)
}

/// Builds the destination user and characters for one player.
///
/// `characters[i]` is the character found in legacy slot `i`. Absent slots are
/// left out of the user's character map. The returned characters are in slot
/// order.
#[must_use]
pub fn map_player(
    player: &LegacyPlayer,
    characters: [Option<LegacyCharacter>; LEGACY_SLOTS as usize],
) -> (User, Vec<Character>) {
    let mut user = User::new(player.steam_id.clone());
    let mut mapped = Vec::with_capacity(characters.len());

    for (legacy_slot, legacy) in (0u8..).zip(characters) {
        let (Some(legacy), Some(slot)) = (legacy, destination_slot(legacy_slot)) else {
            continue;
        };

        user.characters.insert(slot, legacy.id);
        mapped.push(map_character(&player.steam_id, slot, legacy));
    }

    (user, mapped)
}

fn map_character(steam_id: &str, slot: u8, legacy: LegacyCharacter) -> Character {
    Character {
        id: legacy.id,
        steam_id: steam_id.to_string(),
        slot,
        created_at: legacy.created_at,
        data: CharacterData {
            created_at: legacy.created_at,
            size: legacy.size,
            data: legacy.data,
        },
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
