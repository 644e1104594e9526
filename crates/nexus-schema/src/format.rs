//! Serde adapters for BSON-friendly field encodings.
//!
//! BSON document keys must be strings, so slot maps are written with decimal
//! string keys. UUIDs are written as canonical hyphenated strings so the
//! encoding does not depend on the serializer's human-readable flag.

pub(crate) mod uuid_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub(crate) fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&id.hyphenated())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(de::Error::custom)
    }
}

pub(crate) mod slot_map {
    use serde::ser::SerializeMap;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    pub(crate) fn serialize<S: Serializer>(
        map: &BTreeMap<u8, Uuid>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (slot, id) in map {
            out.serialize_entry(&slot.to_string(), &id.hyphenated().to_string())?;
        }
        out.end()
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u8, Uuid>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(slot, id)| {
                let slot = slot
                    .parse::<u8>()
                    .map_err(|e| de::Error::custom(format!("invalid slot key '{slot}': {e}")))?;
                let id = Uuid::parse_str(&id).map_err(de::Error::custom)?;
                Ok((slot, id))
            })
            .collect()
    }
}
