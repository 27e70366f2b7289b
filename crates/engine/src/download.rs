use stowage_crypto::{DecryptionError, PrivateKey, decrypt_object};
use stowage_protocol::{ObjectKind, TransferKey};
use stowage_transfer::reassemble;
use tracing::{debug, info};

use crate::content::ObjectContent;
use crate::engine::TransferEngine;
use crate::error::{EngineError, NotFoundError};

impl TransferEngine {
    /// Downloads an object and reassembles it in chunk order.
    ///
    /// Pass `private_key` for encrypted objects and `None` for plain ones;
    /// a mismatch fails with [`NotFoundError::WrongKind`] before any chunk
    /// is read.
    pub async fn download_object(
        &self,
        key: &TransferKey,
        private_key: Option<&PrivateKey>,
    ) -> Result<ObjectContent, EngineError> {
        let meta = self.lookup(key).await?;

        if !meta.tier.is_supported() {
            return Err(NotFoundError::UnsupportedTier {
                key: key.clone(),
                tier: meta.tier,
            }
            .into());
        }

        let requested = if private_key.is_some() {
            ObjectKind::Encrypted
        } else {
            ObjectKind::Plain
        };
        if meta.kind != requested {
            return Err(NotFoundError::WrongKind {
                key: key.clone(),
                expected: requested,
                actual: meta.kind,
            }
            .into());
        }

        debug!(key = %key, kind = %meta.kind, chunks = meta.chunk_count, "reading chunks");
        let store = &self.store;
        let kind = meta.kind;
        let parts = self
            .executor()
            .run(meta.chunk_count as usize, |i| {
                let order = i as u64;
                async move {
                    let data = store.read_chunk(kind, key, order).await?;
                    Ok::<_, EngineError>((order, data))
                }
            })
            .await?;

        let payload = reassemble(parts, meta.chunk_count)?;
        if payload.len() as u64 != meta.total_size {
            return Err(EngineError::SizeMismatch {
                expected: meta.total_size,
                actual: payload.len() as u64,
            });
        }

        let plaintext = match private_key {
            Some(private_key) => {
                let wrapped_key = meta
                    .wrapped_key
                    .as_deref()
                    .ok_or(DecryptionError::MalformedKeyMaterial { len: 0 })?;
                decrypt_object(&payload, wrapped_key, private_key)?
            }
            None => payload,
        };

        info!(
            key = %key,
            kind = %meta.kind,
            chunks = meta.chunk_count,
            bytes = plaintext.len(),
            "download complete"
        );
        Ok(ObjectContent::from_parts(
            plaintext,
            meta.media_type,
            meta.file_name,
        )?)
    }
}
