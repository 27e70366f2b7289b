use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};
use x25519_dalek::StaticSecret;

use crate::keys::{PrivateKey, PublicKey};
use crate::{
    CryptoError, DecryptionError, IV_LEN, SYMMETRIC_KEY_LEN, TAG_LEN, WRAPPED_KEY_LEN,
    X25519_KEY_LEN,
};

const WRAP_INFO: &[u8] = b"stowage-key-wrap-v1";

/// Per-object symmetric key material. Created once per upload, never reused.
pub struct EncryptionEnvelope {
    symmetric_key: [u8; SYMMETRIC_KEY_LEN],
    iv: [u8; IV_LEN],
}

impl EncryptionEnvelope {
    /// Generates a fresh random key and IV.
    pub fn generate() -> Self {
        Self {
            symmetric_key: rand::random(),
            iv: rand::random(),
        }
    }

    /// Encrypts the whole object under this envelope's key and IV.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(&self.symmetric_key)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        cipher
            .encrypt(Nonce::from_slice(&self.iv), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)
    }

    /// Wraps `key || iv` for `recipient`.
    pub fn wrap(&self, recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        let ephemeral = StaticSecret::from(rand::random::<[u8; X25519_KEY_LEN]>());
        let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&recipient.to_dalek());
        let wrap_key = derive_wrap_key(
            shared.as_bytes(),
            ephemeral_public.as_bytes(),
            recipient.as_bytes(),
        );

        let mut material = Vec::with_capacity(SYMMETRIC_KEY_LEN + IV_LEN);
        material.extend_from_slice(&self.symmetric_key);
        material.extend_from_slice(&self.iv);

        let nonce: [u8; IV_LEN] = rand::random();
        let cipher =
            Aes256Gcm::new_from_slice(&wrap_key).map_err(|_| CryptoError::EncryptionFailed)?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), material.as_slice())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut wrapped = Vec::with_capacity(WRAPPED_KEY_LEN);
        wrapped.extend_from_slice(ephemeral_public.as_bytes());
        wrapped.extend_from_slice(&nonce);
        wrapped.extend_from_slice(&sealed);
        Ok(wrapped)
    }
}

impl std::fmt::Debug for EncryptionEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionEnvelope")
            .field("symmetric_key", &"[redacted]")
            .field("iv", &"[redacted]")
            .finish()
    }
}

/// Result of [`encrypt_object`].
#[derive(Debug, Clone)]
pub struct SealedObject {
    pub ciphertext: Vec<u8>,
    pub wrapped_key: Vec<u8>,
}

/// Encrypts a whole object for `recipient`.
///
/// Chunking must happen on the returned ciphertext, never on plaintext.
pub fn encrypt_object(plaintext: &[u8], recipient: &PublicKey) -> Result<SealedObject, CryptoError> {
    let envelope = EncryptionEnvelope::generate();
    let ciphertext = envelope.seal(plaintext)?;
    let wrapped_key = envelope.wrap(recipient)?;
    Ok(SealedObject {
        ciphertext,
        wrapped_key,
    })
}

/// Recovers the plaintext of an object sealed by [`encrypt_object`].
pub fn decrypt_object(
    ciphertext: &[u8],
    wrapped_key: &[u8],
    private_key: &PrivateKey,
) -> Result<Vec<u8>, DecryptionError> {
    let material = unwrap_key(wrapped_key, private_key)?;
    if material.len() != SYMMETRIC_KEY_LEN + IV_LEN {
        return Err(DecryptionError::KeyLengthMismatch {
            len: material.len(),
            expected: SYMMETRIC_KEY_LEN + IV_LEN,
        });
    }
    let (key, iv) = material.split_at(SYMMETRIC_KEY_LEN);

    if ciphertext.len() < TAG_LEN {
        return Err(DecryptionError::TruncatedCiphertext {
            len: ciphertext.len(),
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| DecryptionError::KeyLengthMismatch {
        len: key.len(),
        expected: SYMMETRIC_KEY_LEN,
    })?;
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| DecryptionError::CorruptCiphertext)
}

fn unwrap_key(wrapped: &[u8], private_key: &PrivateKey) -> Result<Vec<u8>, DecryptionError> {
    if wrapped.len() < X25519_KEY_LEN + IV_LEN + TAG_LEN {
        return Err(DecryptionError::MalformedKeyMaterial { len: wrapped.len() });
    }
    let (ephemeral, rest) = wrapped.split_at(X25519_KEY_LEN);
    let (nonce, sealed) = rest.split_at(IV_LEN);

    let mut ephemeral_bytes = [0u8; X25519_KEY_LEN];
    ephemeral_bytes.copy_from_slice(ephemeral);
    let ephemeral_public = x25519_dalek::PublicKey::from(ephemeral_bytes);

    let shared = private_key.secret().diffie_hellman(&ephemeral_public);
    let wrap_key = derive_wrap_key(
        shared.as_bytes(),
        &ephemeral_bytes,
        private_key.public_key().as_bytes(),
    );

    let cipher = Aes256Gcm::new_from_slice(&wrap_key)
        .map_err(|_| DecryptionError::MalformedKeyMaterial { len: wrapped.len() })?;
    // A GCM failure here means the agreement produced a different key.
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| DecryptionError::KeyMismatch)
}

fn derive_wrap_key(
    shared: &[u8; X25519_KEY_LEN],
    ephemeral_public: &[u8; X25519_KEY_LEN],
    recipient_public: &[u8; X25519_KEY_LEN],
) -> [u8; SYMMETRIC_KEY_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(WRAP_INFO);
    hasher.update(shared);
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    hasher.finalize().into()
}
