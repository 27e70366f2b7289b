//! Client side of the remote store's call channel.
//!
//! The store is reached through two capabilities the host application
//! provides: a [`CallChannel`] that issues calls and certified reads, and a
//! [`CertificateVerifier`] that checks certified reads against a trusted
//! root. Keeping both behind traits decouples the engine from the wire
//! encoding and certificate cryptography, and keeps it testable with mocks.
//!
//! On top of those seams this crate provides:
//!
//! - [`CallSubmitter`]: fire-and-forget chunk writes returning a [`CallHandle`]
//! - [`StatusPoller`]: resolves a handle to a [`CallOutcome`] via certified state
//! - [`StoreClient`]: typed queries and awaited management updates

pub mod channel;
pub mod client;
pub mod status;
pub mod submitter;

pub use channel::{CallChannel, CertificateVerifier, CertifiedBlob, RemoteFuture, StatePath, VerifiedState};
pub use client::{StoreClient, UpdatePolicy};
pub use status::{CallOutcome, RequestStatus, StatusPoller};
pub use submitter::CallSubmitter;

use stowage_protocol::{CallHandle, EncodingError, StoreError};

/// Errors produced while talking to the remote store.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("call channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("call rejected (code {code}): {message}")]
    Rejected { code: u64, message: String },

    #[error("certified read failed verification: {0}")]
    Certificate(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("call {handle} still {status} after {attempts} status checks")]
    Unresolved {
        handle: CallHandle,
        status: RequestStatus,
        attempts: u32,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
