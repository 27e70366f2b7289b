//! Engine error types.

use stowage_crypto::{CryptoError, DecryptionError};
use stowage_protocol::{EncodingError, ObjectKind, StorageTier, StoreError, TransferKey};
use stowage_remote::TransportError;
use stowage_transfer::{AdmissionError, RetryError, RetryErrorKind, RetryableError, TransferError};

/// Errors produced by the transfer engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("admission refused: {0}")]
    Admission(#[from] AdmissionError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("retries exhausted ({failed} operations still failing): {last_reason}")]
    RetryExhausted { last_reason: String, failed: usize },

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("upload of {key} incomplete: {unconfirmed} chunks unconfirmed")]
    UploadIncomplete { key: TransferKey, unconfirmed: u64 },

    #[error("page size {requested} exceeds the maximum of {max}")]
    PageSizeExceeded { requested: u32, max: u32 },

    #[error("invalid transfer key: {0}")]
    InvalidKey(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("chunk error: {0}")]
    Chunk(TransferError),

    #[error("object size mismatch: expected {expected} bytes, reassembled {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// The requested object cannot be served as asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("no object stored under {0}")]
    UnknownKey(TransferKey),

    #[error("{key} is stored {actual}, requested as {expected}")]
    WrongKind {
        key: TransferKey,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("{key} lives on the {tier} tier, which is not supported")]
    UnsupportedTier { key: TransferKey, tier: StorageTier },
}

impl From<TransportError> for EngineError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Encoding(e) => Self::Encoding(e),
            TransportError::Store(e) => Self::Store(e),
            other => Self::Transport(other),
        }
    }
}

impl From<TransferError> for EngineError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::InvalidKey(reason) => Self::InvalidKey(reason),
            TransferError::PageSizeExceeded { requested, max } => {
                Self::PageSizeExceeded { requested, max }
            }
            other => Self::Chunk(other),
        }
    }
}

impl<T> From<RetryError<T, EngineError>> for EngineError {
    fn from(e: RetryError<T, EngineError>) -> Self {
        match e.kind {
            RetryErrorKind::Fatal => e.last_error,
            RetryErrorKind::Exhausted => Self::RetryExhausted {
                failed: e.failed_indices().len(),
                last_reason: e.last_error.to_string(),
            },
        }
    }
}

impl RetryableError for EngineError {
    /// Only channel-level failures are worth another attempt. Everything
    /// else is a structurally wrong request or a definitive answer.
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
