//! Wire types shared between the transfer engine and the remote store.
//!
//! The remote store's service methods are consumed as named calls with
//! fixed argument and reply shapes. This crate owns those shapes and the
//! codec that turns them into opaque call arguments.

pub mod codec;
pub mod constants;
pub mod messages;
pub mod types;

pub use codec::{EncodingError, decode_reply, encode_args};
pub use constants::StoreMethod;
pub use messages::{
    AssetMetaReply, ChunkData, ChunkPut, ChunkReply, ChunkRequest, FilePut, KeyRequest,
    PageRequest, PutReply, ShareRequest, UnitReply, VisibilityRequest,
};
pub use types::{
    AssetMeta, BoxState, CallHandle, MEDIA_BYTES, MEDIA_TEXT, ObjectKind, StorageTier, StoreError,
    TransferKey,
};
