use serde::{Deserialize, Serialize};

/// Media type recorded for raw byte uploads.
pub const MEDIA_BYTES: &str = "uint8array";

/// Media type recorded for UTF-8 text uploads.
pub const MEDIA_TEXT: &str = "text/plain";

/// Opaque key identifying one object within a store.
///
/// Uniqueness is the caller's responsibility; the store treats a second
/// upload under the same key as an overwrite of the same chunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferKey(String);

impl TransferKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TransferKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransferKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TransferKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Storage class of an object: stored as-is, or hybrid-encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Plain,
    Encrypted,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Encrypted => f.write_str("encrypted"),
        }
    }
}

/// Backend tier an object's chunks live on.
///
/// Only [`StorageTier::Ic`] is served by the store itself; the external
/// archival tiers are recognised on the wire but not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageTier {
    #[serde(rename = "IC")]
    Ic,
    #[serde(rename = "Arweave")]
    Arweave,
    #[serde(rename = "IPFS")]
    Ipfs,
}

impl StorageTier {
    /// Returns `true` if chunks on this tier can be read and written.
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Ic => true,
            Self::Arweave | Self::Ipfs => false,
        }
    }
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ic => f.write_str("IC"),
            Self::Arweave => f.write_str("Arweave"),
            Self::Ipfs => f.write_str("IPFS"),
        }
    }
}

/// Metadata record the store keeps for a fully uploaded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub key: TransferKey,
    pub kind: ObjectKind,
    pub tier: StorageTier,
    #[serde(default)]
    pub file_name: String,
    pub media_type: String,
    pub total_size: u64,
    /// Number of chunk reads needed to fetch the whole object.
    pub chunk_count: u64,
    pub is_private: bool,
    /// Wrapped symmetric key material (encrypted objects only).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::messages::base64_opt"
    )]
    pub wrapped_key: Option<Vec<u8>>,
}

/// Resource state reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxState {
    /// Heap bytes in use.
    pub memory_size: u64,
    /// Stable-storage bytes in use.
    pub stable_memory_size: u64,
    /// Spendable balance, in the store's cost unit.
    pub balance: u128,
}

impl BoxState {
    /// Total bytes currently in use.
    pub fn used_bytes(&self) -> u64 {
        self.memory_size.saturating_add(self.stable_memory_size)
    }
}

/// Business-level failure returned inside a store reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StoreError {
    #[error("unknown file key")]
    FileKeyErr,

    #[error("chunk index out of range")]
    FlagErr,

    #[error("permission denied")]
    PermissionDenied,

    #[error("store memory exhausted")]
    MemoryInsufficient,

    #[error("chunk exceeds the store's blob size")]
    BlobSizeErr,

    #[error("missing or invalid wrapped key")]
    FileAesPubKeyErr,

    #[error("already shared with this principal")]
    SharedRepeat,

    #[error("not shared with this principal")]
    SharedNotSet,

    #[error("store error: {0}")]
    Other(String),
}

/// Opaque identifier of an in-flight asynchronous write.
///
/// Holding a handle says nothing about whether the write succeeded; it is
/// only a key into the store's certified request-status tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallHandle(#[serde(with = "hex_bytes")] Vec<u8>);

impl CallHandle {
    pub fn new(id: impl Into<Vec<u8>>) -> Self {
        Self(id.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for CallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
