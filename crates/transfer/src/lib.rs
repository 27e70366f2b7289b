//! Chunked transfer primitives: partitioning, admission control and the
//! concurrent retry executor shared by every remote fan-out.

mod admission;
mod chunked;
mod retry;
mod types;
mod validation;

pub use admission::{
    AdmissionError, AdmissionPolicy, AdmissionQuote, CostModel, DEFAULT_STORAGE_CEILING,
    check_admission, quote,
};
pub use chunked::{Chunks, chunk_count, reassemble, split};
pub use retry::{RetryError, RetryErrorKind, RetryExecutor, RetryPolicy, RetryableError};
pub use types::{ChunkPlan, UploadPhase, UploadSession};
pub use validation::{MAX_KEY_LEN, validate_page_size, validate_transfer_key};

/// Default chunk bound: the largest payload that fits one ingress message
/// after argument encoding overhead.
pub const DEFAULT_CHUNK_SIZE: usize = 1_992_288;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("expected {expected} chunks, got {actual}")]
    ChunkCountMismatch { expected: u64, actual: u64 },

    #[error("chunk {order} out of range (total {total})")]
    ChunkOutOfRange { order: u64, total: u64 },

    #[error("duplicate chunk {0}")]
    DuplicateChunk(u64),

    #[error("invalid transfer key: {0}")]
    InvalidKey(String),

    #[error("page size {requested} exceeds the maximum of {max}")]
    PageSizeExceeded { requested: u32, max: u32 },
}
