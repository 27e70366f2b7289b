//! Chunked object transfer against a remote object store.
//!
//! This crate implements the **orchestration** on top of the primitives in
//! `stowage-transfer` and the call seams in `stowage-remote`. The host
//! application supplies the [`CallChannel`](stowage_remote::CallChannel)
//! and [`CertificateVerifier`](stowage_remote::CertificateVerifier); the
//! engine never talks to the network itself.
//!
//! # Upload pipeline
//!
//! 1. **Encrypt**: optional hybrid encryption of the whole object
//! 2. **Admit**: capacity and balance check for the pending chunks
//! 3. **Submit**: concurrent, throttled chunk writes
//! 4. **Confirm**: visibility polling, then per-call status resolution
//! 5. **Resend**: only chunks whose write was not confirmed

pub mod config;
pub mod content;
mod download;
pub mod engine;
pub mod error;
pub mod events;
mod upload;

pub use config::{CONFIG_ENV, ConfigError, CostConfig, EngineConfig, config_path};
pub use content::{MEDIA_OCTET_STREAM, ObjectContent, ObjectData, UploadOptions};
pub use engine::TransferEngine;
pub use error::{EngineError, NotFoundError};
pub use events::TransferEvent;
