//! Capabilities the host application provides.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use stowage_protocol::{CallHandle, StoreMethod};

use crate::TransportError;

/// Boxed future returned by [`CallChannel`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Abstract channel to the remote store.
pub trait CallChannel: Send + Sync {
    /// Issues an update call and returns as soon as the store accepted it.
    ///
    /// The handle says nothing about whether the call succeeded.
    fn call(&self, method: StoreMethod, args: Vec<u8>) -> RemoteFuture<'_, CallHandle>;

    /// Issues a read-only query and waits for its reply bytes.
    fn query(&self, method: StoreMethod, args: Vec<u8>) -> RemoteFuture<'_, Vec<u8>>;

    /// Reads the given paths of the store's certified state tree.
    fn read_state(&self, paths: Vec<StatePath>) -> RemoteFuture<'_, CertifiedBlob>;
}

/// Checks certified reads against a trusted root.
pub trait CertificateVerifier: Send + Sync {
    /// Verifies `blob` and returns the leaves it proves.
    ///
    /// Nothing in an unverified blob may be trusted.
    fn verify(&self, blob: &CertifiedBlob) -> Result<VerifiedState, TransportError>;
}

/// Label path into the certified state tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatePath(Vec<Vec<u8>>);

impl StatePath {
    pub fn new(labels: Vec<Vec<u8>>) -> Self {
        Self(labels)
    }

    /// `request_status/<handle>/<leaf>`.
    pub fn request_status(handle: &CallHandle, leaf: &str) -> Self {
        Self(vec![
            b"request_status".to_vec(),
            handle.as_bytes().to_vec(),
            leaf.as_bytes().to_vec(),
        ])
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.0
    }
}

impl std::fmt::Display for StatePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match std::str::from_utf8(label) {
                Ok(s) if s.bytes().all(|b| b.is_ascii_graphic()) => f.write_str(s)?,
                _ => f.write_str(&hex::encode(label))?,
            }
        }
        Ok(())
    }
}

/// Unverified certified-read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertifiedBlob(Vec<u8>);

impl CertifiedBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Leaves proven by a verified certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedState {
    leaves: BTreeMap<StatePath, Vec<u8>>,
}

impl VerifiedState {
    pub fn from_leaves<I: IntoIterator<Item = (StatePath, Vec<u8>)>>(leaves: I) -> Self {
        Self {
            leaves: leaves.into_iter().collect(),
        }
    }

    /// Returns the leaf at `path`, or `None` if the certificate proves
    /// its absence.
    pub fn lookup(&self, path: &StatePath) -> Option<&[u8]> {
        self.leaves.get(path).map(Vec::as_slice)
    }
}
