//! Typed access to the store's service methods.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use stowage_protocol::{
    AssetMeta, AssetMetaReply, BoxState, ChunkReply, ChunkRequest, KeyRequest, ObjectKind,
    PageRequest, ShareRequest, StoreMethod, TransferKey, UnitReply, VisibilityRequest,
    decode_reply, encode_args,
};
use tracing::debug;

use crate::TransportError;
use crate::channel::{CallChannel, CertificateVerifier};
use crate::status::StatusPoller;
use crate::submitter::CallSubmitter;

/// How long management updates are polled for a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Store client over the host-provided channel and verifier.
///
/// Queries are direct request/response calls. Management updates are
/// submitted and then awaited through the certified status path.
#[derive(Clone)]
pub struct StoreClient {
    channel: Arc<dyn CallChannel>,
    verifier: Arc<dyn CertificateVerifier>,
    update_policy: UpdatePolicy,
}

impl StoreClient {
    pub fn new(channel: Arc<dyn CallChannel>, verifier: Arc<dyn CertificateVerifier>) -> Self {
        Self {
            channel,
            verifier,
            update_policy: UpdatePolicy::default(),
        }
    }

    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    pub fn submitter(&self) -> CallSubmitter<'_> {
        CallSubmitter::new(self.channel.as_ref())
    }

    pub fn poller(&self) -> StatusPoller<'_> {
        StatusPoller::new(self.channel.as_ref(), self.verifier.as_ref())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current usage and spendable balance of the store.
    pub async fn box_state(&self) -> Result<BoxState, TransportError> {
        self.query(StoreMethod::BoxState, &()).await
    }

    /// Metadata of a fully uploaded object.
    ///
    /// An object that is not (yet) visible fails with
    /// `TransportError::Store(StoreError::FileKeyErr)`.
    pub async fn asset_meta(
        &self,
        key: &TransferKey,
        kind: Option<ObjectKind>,
    ) -> Result<AssetMeta, TransportError> {
        let req = KeyRequest {
            key: key.clone(),
            kind,
        };
        let reply: AssetMetaReply = self.query(StoreMethod::GetAssetMeta, &req).await?;
        Ok(reply?)
    }

    /// Reads one chunk of an object.
    pub async fn read_chunk(
        &self,
        kind: ObjectKind,
        key: &TransferKey,
        order: u64,
    ) -> Result<Vec<u8>, TransportError> {
        let method = match kind {
            ObjectKind::Plain => StoreMethod::GetPlain,
            ObjectKind::Encrypted => StoreMethod::GetCipher,
        };
        let req = ChunkRequest {
            key: key.clone(),
            order,
        };
        let reply: ChunkReply = self.query(method, &req).await?;
        Ok(reply?.data)
    }

    /// One page of object metadata of `kind`.
    pub async fn list_page(
        &self,
        kind: ObjectKind,
        page_size: u32,
        page_index: u32,
    ) -> Result<Vec<AssetMeta>, TransportError> {
        let req = PageRequest {
            kind,
            page_size,
            page_index,
        };
        self.query(StoreMethod::GetPageFiles, &req).await
    }

    /// Number of stored objects of `kind`.
    pub async fn file_count(&self, kind: ObjectKind) -> Result<u64, TransportError> {
        self.query(StoreMethod::GetFileNums, &kind).await
    }

    // -----------------------------------------------------------------------
    // Management updates
    // -----------------------------------------------------------------------

    pub async fn delete(&self, key: &TransferKey, kind: ObjectKind) -> Result<(), TransportError> {
        let req = KeyRequest {
            key: key.clone(),
            kind: Some(kind),
        };
        self.update(StoreMethod::DeleteFile, &req).await
    }

    pub async fn clear_all(&self) -> Result<(), TransportError> {
        self.update(StoreMethod::ClearAll, &()).await
    }

    pub async fn set_visibility(
        &self,
        key: &TransferKey,
        is_private: bool,
    ) -> Result<(), TransportError> {
        let req = VisibilityRequest {
            key: key.clone(),
            is_private,
        };
        self.update(StoreMethod::SetVisibility, &req).await
    }

    pub async fn share(&self, key: &TransferKey, to: &str) -> Result<(), TransportError> {
        let req = ShareRequest {
            key: key.clone(),
            to: to.to_string(),
        };
        self.update(StoreMethod::AddPrivateShare, &req).await
    }

    pub async fn unshare(&self, key: &TransferKey, to: &str) -> Result<(), TransportError> {
        let req = ShareRequest {
            key: key.clone(),
            to: to.to_string(),
        };
        self.update(StoreMethod::RemovePrivateShare, &req).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn query<A: Serialize, R: DeserializeOwned>(
        &self,
        method: StoreMethod,
        args: &A,
    ) -> Result<R, TransportError> {
        let bytes = self.channel.query(method, encode_args(args)?).await?;
        debug!(method = %method, reply_bytes = bytes.len(), "query replied");
        Ok(decode_reply(&bytes)?)
    }

    async fn update<A: Serialize>(&self, method: StoreMethod, args: &A) -> Result<(), TransportError> {
        let handle = self.channel.call(method, encode_args(args)?).await?;
        debug!(method = %method, handle = %handle, "update submitted");
        let reply: UnitReply = self
            .poller()
            .wait(
                &handle,
                self.update_policy.interval,
                self.update_policy.max_attempts,
            )
            .await?;
        Ok(reply?)
    }
}
