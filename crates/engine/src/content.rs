//! Object payloads as callers hand them in and get them back.

use stowage_crypto::PublicKey;
use stowage_protocol::{EncodingError, MEDIA_BYTES, MEDIA_TEXT, TransferKey};

/// Media type recorded for blobs uploaded without one.
pub const MEDIA_OCTET_STREAM: &str = "application/octet-stream";

/// Data to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    /// Raw bytes, stored with media type [`MEDIA_BYTES`].
    Bytes(Vec<u8>),
    /// UTF-8 text, stored with media type [`MEDIA_TEXT`].
    Text(String),
    /// A typed blob carrying its own media type and optional file name.
    Blob {
        bytes: Vec<u8>,
        media_type: String,
        file_name: String,
    },
}

impl ObjectData {
    /// Splits into `(bytes, media_type, file_name)`.
    pub(crate) fn into_parts(self) -> (Vec<u8>, String, String) {
        match self {
            Self::Bytes(bytes) => (bytes, MEDIA_BYTES.into(), String::new()),
            Self::Text(text) => (text.into_bytes(), MEDIA_TEXT.into(), String::new()),
            Self::Blob {
                bytes,
                media_type,
                file_name,
            } => {
                let media_type = if media_type.trim().is_empty() {
                    MEDIA_OCTET_STREAM.into()
                } else {
                    media_type
                };
                (bytes, media_type, file_name)
            }
        }
    }
}

/// Downloaded object, interpreted per its stored media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectContent {
    Bytes(Vec<u8>),
    Text(String),
    Blob {
        bytes: Vec<u8>,
        media_type: String,
        file_name: String,
    },
}

impl ObjectContent {
    pub(crate) fn from_parts(
        bytes: Vec<u8>,
        media_type: String,
        file_name: String,
    ) -> Result<Self, EncodingError> {
        Ok(match media_type.as_str() {
            MEDIA_BYTES => Self::Bytes(bytes),
            MEDIA_TEXT => Self::Text(String::from_utf8(bytes)?),
            _ => Self::Blob {
                bytes,
                media_type,
                file_name,
            },
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) | Self::Blob { bytes, .. } => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) | Self::Blob { bytes, .. } => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }
}

/// Upload options.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Restrict reads to the owner. Ignored for encrypted uploads, which
    /// are always private.
    pub is_private: bool,
    /// Encrypt for this recipient.
    pub public_key: Option<PublicKey>,
    /// Store under this key instead of a generated one.
    pub key: Option<TransferKey>,
}
