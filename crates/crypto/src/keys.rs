use x25519_dalek::StaticSecret;

use crate::{CryptoError, X25519_KEY_LEN};

/// Recipient public key (X25519).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; X25519_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; X25519_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Ok(Self(decode_key(s)?))
    }

    pub fn as_bytes(&self) -> &[u8; X25519_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn to_dalek(self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

/// Recipient private key (X25519). Debug output is redacted.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; X25519_KEY_LEN]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Parses a hex-encoded private key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Ok(Self::from_bytes(decode_key(s)?))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*x25519_dalek::PublicKey::from(&self.0).as_bytes())
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKey").field(&"[redacted]").finish()
    }
}

/// A recipient key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private: PrivateKey,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generates a fresh random key pair.
    pub fn generate() -> Self {
        let bytes: [u8; X25519_KEY_LEN] = rand::random();
        let private = PrivateKey::from_bytes(bytes);
        let public = private.public_key();
        Self { private, public }
    }
}

fn decode_key(s: &str) -> Result<[u8; X25519_KEY_LEN], CryptoError> {
    let bytes = hex::decode(s.trim()).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        CryptoError::InvalidKey(format!(
            "expected {X25519_KEY_LEN} bytes, got {}",
            b.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let pair = KeyPair::generate();
        let public = PublicKey::from_hex(&pair.public.to_hex()).unwrap();
        let private = PrivateKey::from_hex(&pair.private.to_hex()).unwrap();
        assert_eq!(public, pair.public);
        assert_eq!(private.public_key(), pair.public);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = PublicKey::from_hex("abcd").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
        assert!(PrivateKey::from_hex("not hex").is_err());
    }

    #[test]
    fn private_key_debug_is_redacted() {
        let pair = KeyPair::generate();
        let dbg = format!("{:?}", pair.private);
        assert!(!dbg.contains(&pair.private.to_hex()));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn generated_pairs_differ() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public, b.public);
    }
}
