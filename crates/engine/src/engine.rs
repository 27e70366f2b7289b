//! Transfer engine: the produced surface over one remote store.

use tokio::sync::mpsc;
use tracing::{debug, info};

use stowage_protocol::{AssetMeta, BoxState, ObjectKind, StoreError, TransferKey};
use stowage_remote::{StoreClient, TransportError};
use stowage_transfer::{AdmissionQuote, RetryExecutor, chunk_count, quote, validate_page_size};

use crate::config::EngineConfig;
use crate::error::{EngineError, NotFoundError};
use crate::events::TransferEvent;

/// Moves objects into and out of one remote store.
///
/// Upload progress is reported as [`TransferEvent`]s on a bounded channel.
/// Events are dropped, never awaited, when nobody drains the receiver.
pub struct TransferEngine {
    pub(crate) store: StoreClient,
    pub(crate) config: EngineConfig,
    events_tx: mpsc::Sender<TransferEvent>,
    events_rx: Option<mpsc::Receiver<TransferEvent>>,
}

impl TransferEngine {
    pub fn new(store: StoreClient, config: EngineConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        let store = store.with_update_policy(config.update_policy());
        Self {
            store,
            config,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransferEvent>> {
        self.events_rx.take()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn emit(&self, event: TransferEvent) {
        let _ = self.events_tx.try_send(event);
    }

    pub(crate) fn executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.config.retry_policy())
    }

    /// Current usage and balance of the store.
    pub async fn box_state(&self) -> Result<BoxState, EngineError> {
        Ok(self.store.box_state().await?)
    }

    /// Estimates what storing `pending_bytes` more bytes would cost.
    ///
    /// Never fails on an insufficient budget; check
    /// [`AdmissionQuote::shortfall`] instead.
    pub async fn estimate_cost(&self, pending_bytes: u64) -> Result<AdmissionQuote, EngineError> {
        let chunks = chunk_count(pending_bytes, self.config.chunk_size)?;
        let state = self.store.box_state().await?;
        let quote = quote(
            chunks,
            self.config.chunk_size,
            &state,
            &self.config.admission_policy(),
        );
        debug!(
            pending_bytes,
            chunks,
            cost = %quote.cost_estimate,
            "cost estimated"
        );
        Ok(quote)
    }

    /// Lists one page of objects of `kind`.
    ///
    /// The page size is checked before the store is contacted.
    pub async fn list_objects(
        &self,
        kind: ObjectKind,
        page_size: u32,
        page_index: u32,
    ) -> Result<Vec<AssetMeta>, EngineError> {
        validate_page_size(page_size, self.config.max_page_size)?;
        Ok(self.store.list_page(kind, page_size, page_index).await?)
    }

    /// Number of stored objects of `kind`.
    pub async fn file_count(&self, kind: ObjectKind) -> Result<u64, EngineError> {
        Ok(self.store.file_count(kind).await?)
    }

    /// Deletes an object of either kind.
    pub async fn delete_object(&self, key: &TransferKey) -> Result<(), EngineError> {
        let meta = self.lookup(key).await?;
        self.store.delete(key, meta.kind).await?;
        info!(key = %key, kind = %meta.kind, "object deleted");
        Ok(())
    }

    /// Deletes every object in the store.
    pub async fn clear_all(&self) -> Result<(), EngineError> {
        self.store.clear_all().await?;
        info!("store cleared");
        Ok(())
    }

    /// Switches a plain object between public and private.
    pub async fn set_visibility(&self, key: &TransferKey, is_private: bool) -> Result<(), EngineError> {
        let meta = self.lookup(key).await?;
        if meta.kind != ObjectKind::Plain {
            return Err(NotFoundError::WrongKind {
                key: key.clone(),
                expected: ObjectKind::Plain,
                actual: meta.kind,
            }
            .into());
        }
        self.store.set_visibility(key, is_private).await?;
        debug!(key = %key, is_private, "visibility updated");
        Ok(())
    }

    /// Grants `to` read access to a private plain object.
    pub async fn share_private(&self, key: &TransferKey, to: &str) -> Result<(), EngineError> {
        self.store.share(key, to).await?;
        debug!(key = %key, to, "object shared");
        Ok(())
    }

    /// Revokes a grant made by [`share_private`](Self::share_private).
    pub async fn unshare_private(&self, key: &TransferKey, to: &str) -> Result<(), EngineError> {
        self.store.unshare(key, to).await?;
        debug!(key = %key, to, "object unshared");
        Ok(())
    }

    /// Metadata of `key`, mapping an unknown key to [`NotFoundError`].
    pub(crate) async fn lookup(&self, key: &TransferKey) -> Result<AssetMeta, EngineError> {
        match self.store.asset_meta(key, None).await {
            Ok(meta) => Ok(meta),
            Err(TransportError::Store(StoreError::FileKeyErr)) => {
                Err(NotFoundError::UnknownKey(key.clone()).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
