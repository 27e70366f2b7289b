//! Call argument and reply codec.
//!
//! The store receives each call's argument as an opaque byte blob and
//! embeds its reply the same way inside the certified request-status tree.
//! Both directions use JSON so a reply can be decoded with the same schema
//! the call declared.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors produced while encoding call arguments or decoding replies.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("schema mismatch for {expected}: {source}")]
    SchemaMismatch {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid UTF-8 text payload")]
    InvalidText(#[from] std::string::FromUtf8Error),
}

/// Encodes a call argument into the store's expected argument bytes.
pub fn encode_args<T: Serialize>(args: &T) -> Result<Vec<u8>, EncodingError> {
    serde_json::to_vec(args).map_err(|source| EncodingError::SchemaMismatch {
        expected: std::any::type_name::<T>(),
        source,
    })
}

/// Decodes reply bytes using the declared return type `T`.
pub fn decode_reply<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EncodingError> {
    serde_json::from_slice(bytes).map_err(|source| EncodingError::SchemaMismatch {
        expected: std::any::type_name::<T>(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ChunkRequest, PutReply};
    use crate::types::StoreError;

    #[test]
    fn reply_decodes_with_declared_type() {
        let bytes = encode_args(&PutReply::Err(StoreError::FileKeyErr)).unwrap();
        let reply: PutReply = decode_reply(&bytes).unwrap();
        assert_eq!(reply, Err(StoreError::FileKeyErr));
    }

    #[test]
    fn wrong_schema_is_reported() {
        let bytes = encode_args(&ChunkRequest {
            key: "k".into(),
            order: 3,
        })
        .unwrap();
        let err = decode_reply::<PutReply>(&bytes).unwrap_err();
        assert!(matches!(err, EncodingError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("schema mismatch"));
    }

    #[test]
    fn garbage_bytes_fail() {
        assert!(decode_reply::<PutReply>(b"\xff\x00").is_err());
    }
}
