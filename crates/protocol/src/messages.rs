use serde::{Deserialize, Serialize};

use crate::types::{AssetMeta, ObjectKind, StorageTier, StoreError, TransferKey};

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// One chunk of an object as the store's `put` method receives it.
///
/// All chunks of an object share `key`, `total_chunks`, `total_size`,
/// `media_type` and `is_private`; `order` runs densely from 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPut {
    pub key: TransferKey,
    pub order: u64,
    pub total_chunks: u64,
    pub total_size: u64,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub wrapped_key: Option<Vec<u8>>,
    pub is_private: bool,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
}

/// Argument of the store's `put` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePut {
    pub kind: ObjectKind,
    pub tier: StorageTier,
    pub chunk: ChunkPut,
}

/// Declared return type of the store's `put` method.
pub type PutReply = Result<(), StoreError>;

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Argument of `getPlain` / `getCipher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRequest {
    pub key: TransferKey,
    pub order: u64,
}

/// Reply payload of `getPlain` / `getCipher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkData {
    pub order: u64,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Declared return type of `getPlain` / `getCipher`.
pub type ChunkReply = Result<ChunkData, StoreError>;

/// Argument of the per-object methods (`getAssetextkey`, `deleteFileFromKey`).
///
/// `kind` is omitted when the caller does not know the object's class yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequest {
    pub key: TransferKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ObjectKind>,
}

/// Declared return type of `getAssetextkey`.
pub type AssetMetaReply = Result<AssetMeta, StoreError>;

/// Declared return type of the management update methods.
pub type UnitReply = Result<(), StoreError>;

/// Argument of `setPlainFilePubOrPri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub key: TransferKey,
    pub is_private: bool,
}

/// Argument of `getPageFiles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub kind: ObjectKind,
    pub page_size: u32,
    pub page_index: u32,
}

/// Argument of the private-share methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub key: TransferKey,
    /// Principal text of the grantee.
    pub to: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Byte fields travel as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod base64_opt {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        data: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        data.as_ref()
            .map(|bytes| STANDARD.encode(bytes))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| STANDARD.decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> ChunkPut {
        ChunkPut {
            key: "k1".into(),
            order: 0,
            total_chunks: 1,
            total_size: 5,
            data: b"Hello".to_vec(),
            wrapped_key: None,
            is_private: false,
            media_type: "text/plain".into(),
            file_name: String::new(),
        }
    }

    #[test]
    fn chunk_data_is_base64() {
        let json = serde_json::to_string(&sample_chunk()).unwrap();
        // "Hello" = "SGVsbG8="
        assert!(json.contains("SGVsbG8="));
        assert!(!json.contains("wrappedKey"));
        assert!(!json.contains("fileName"));
    }

    #[test]
    fn wrapped_key_roundtrip() {
        let chunk = ChunkPut {
            wrapped_key: Some(vec![1, 2, 3]),
            ..sample_chunk()
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("\"wrappedKey\":\"AQID\""));
        let parsed: ChunkPut = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.wrapped_key, Some(vec![1, 2, 3]));
    }

    #[test]
    fn put_reply_shape() {
        let ok: PutReply = Ok(());
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"Ok":null}"#);
        let err: PutReply = Err(StoreError::MemoryInsufficient);
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"Err":"MemoryInsufficient"}"#
        );
    }

    #[test]
    fn key_request_omits_unknown_kind() {
        let req = KeyRequest {
            key: "k".into(),
            kind: None,
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"key":"k"}"#);
    }

    #[test]
    fn chunk_reply_decodes_bytes() {
        let reply: ChunkReply = serde_json::from_str(r#"{"Ok":{"order":2,"data":"AQID"}}"#).unwrap();
        assert_eq!(
            reply,
            Ok(ChunkData {
                order: 2,
                data: vec![1, 2, 3]
            })
        );
    }

    #[test]
    fn file_put_wire_shape() {
        let put = FilePut {
            kind: ObjectKind::Encrypted,
            tier: StorageTier::Ic,
            chunk: sample_chunk(),
        };
        let value = serde_json::to_value(&put).unwrap();
        assert_eq!(value["kind"], "encrypted");
        assert_eq!(value["tier"], "IC");
        assert_eq!(value["chunk"]["totalChunks"], 1);
    }
}
