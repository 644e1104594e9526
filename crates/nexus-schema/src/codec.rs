//! BSON document codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while converting documents to or from bytes.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value could not be serialized as a BSON document.
    #[error("bson encode failed: {0}")]
    Encode(#[from] bson::ser::Error),

    /// The bytes are not a valid document of the requested type.
    #[error("bson decode failed: {0}")]
    Decode(#[from] bson::de::Error),
}

/// Serializes a document to BSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the value does not serialize to a
/// top-level BSON document.
pub fn encode<T: Serialize>(doc: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bson::to_vec(doc)?)
}

/// Deserializes a document from BSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes are malformed or do not match `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(bson::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rejects_non_document() {
        let result = encode(&42_i32);
        assert!(matches!(result, Err(CodecError::Encode(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<crate::User, _> = decode(&[0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
