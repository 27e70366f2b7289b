//! Hybrid encryption for stored objects.
//!
//! A fresh AES-256-GCM key and IV are generated per object and used to
//! encrypt the whole plaintext. `key || iv` is then wrapped for the
//! recipient with an ephemeral X25519 agreement, so only the holder of the
//! matching private key can recover it.
//!
//! # Wrapped key layout
//!
//! ```text
//! ephemeral public key (32) || wrap nonce (12) || AES-GCM(key || iv) (44 + 16 tag)
//! ```

mod hybrid;
mod keys;

pub use hybrid::{EncryptionEnvelope, SealedObject, decrypt_object, encrypt_object};
pub use keys::{KeyPair, PrivateKey, PublicKey};

/// Symmetric key length in bytes (AES-256).
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// IV length in bytes (96-bit GCM nonce).
pub const IV_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// X25519 key length in bytes.
pub const X25519_KEY_LEN: usize = 32;

/// Length of the wrapped `key || iv` material.
pub const WRAPPED_KEY_LEN: usize = X25519_KEY_LEN + IV_LEN + SYMMETRIC_KEY_LEN + IV_LEN + TAG_LEN;

/// Errors produced while preparing keys or encrypting.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key encoding: {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    EncryptionFailed,
}

/// Decryption failures, split so callers can tell a wrong key from
/// corrupted data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecryptionError {
    #[error("wrapped key material is malformed ({len} bytes)")]
    MalformedKeyMaterial { len: usize },

    #[error("unwrapped key material has length {len}, expected {expected}")]
    KeyLengthMismatch { len: usize, expected: usize },

    #[error("private key does not match the wrapped key material")]
    KeyMismatch,

    #[error("ciphertext truncated ({len} bytes)")]
    TruncatedCiphertext { len: usize },

    #[error("ciphertext failed authentication")]
    CorruptCiphertext,
}
