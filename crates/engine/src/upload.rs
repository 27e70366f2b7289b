//! Upload workflow.
//!
//! 1. **Admit** the pending chunks against the store's capacity and balance
//! 2. **Submit** every pending chunk through the retry executor
//! 3. **Poll** until the object's metadata becomes visible
//! 4. **Resolve** every call handle if it never did, and resend only the
//!    chunks whose write was not confirmed
//!
//! The first round is followed by up to `upload_retries` resend rounds.

use stowage_crypto::encrypt_object;
use stowage_protocol::{CallHandle, ObjectKind, PutReply, StorageTier, StoreError, TransferKey};
use stowage_remote::{CallOutcome, TransportError};
use stowage_transfer::{
    ChunkPlan, RetryErrorKind, UploadSession, check_admission, chunk_count, split,
    validate_transfer_key,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::content::{ObjectData, UploadOptions};
use crate::engine::TransferEngine;
use crate::error::EngineError;
use crate::events::TransferEvent;

impl TransferEngine {
    /// Uploads one object and returns the key it is stored under.
    ///
    /// With a public key the whole object is encrypted before chunking and
    /// stored private; otherwise it is stored as-is.
    pub async fn upload_object(
        &self,
        data: ObjectData,
        options: UploadOptions,
    ) -> Result<TransferKey, EngineError> {
        let key = match options.key {
            Some(key) => {
                validate_transfer_key(key.as_str())?;
                key
            }
            None => TransferKey::new(Uuid::new_v4().to_string()),
        };

        let (plaintext, media_type, file_name) = data.into_parts();
        let (kind, payload, wrapped_key, is_private) = match &options.public_key {
            Some(recipient) => {
                let sealed = encrypt_object(&plaintext, recipient)?;
                (
                    ObjectKind::Encrypted,
                    sealed.ciphertext,
                    Some(sealed.wrapped_key),
                    true,
                )
            }
            None => (ObjectKind::Plain, plaintext, None, options.is_private),
        };

        let plan = ChunkPlan {
            key: key.clone(),
            kind,
            tier: StorageTier::Ic,
            total_chunks: chunk_count(payload.len() as u64, self.config.chunk_size)?,
            total_size: payload.len() as u64,
            media_type,
            file_name,
            is_private,
            wrapped_key,
        };
        let mut session = UploadSession::new(key.clone(), plan.total_chunks);

        match self.run_upload(&plan, &payload, &mut session).await {
            Ok(()) => {
                session.complete();
                info!(
                    key = %key,
                    kind = %kind,
                    chunks = plan.total_chunks,
                    bytes = plan.total_size,
                    rounds = session.round(),
                    elapsed_ms = session.elapsed().as_millis() as u64,
                    "upload complete"
                );
                self.emit(TransferEvent::Completed {
                    key: key.clone(),
                    chunks: plan.total_chunks,
                });
                Ok(key)
            }
            Err(e) => {
                session.fail(e.to_string());
                error!(key = %key, round = session.round(), error = %e, "upload failed");
                self.emit(TransferEvent::Failed {
                    key,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_upload(
        &self,
        plan: &ChunkPlan,
        payload: &[u8],
        session: &mut UploadSession,
    ) -> Result<(), EngineError> {
        let chunk_size = self.config.chunk_size;
        let slices: Vec<&[u8]> = split(payload, chunk_size)?.collect();
        let policy = self.config.admission_policy();
        let resends = self.config.upload_retries;

        loop {
            let pending = session.pending();

            // Nothing left to send means every write replied Ok and only
            // visibility is outstanding.
            if !pending.is_empty() {
                let state = self.store.box_state().await?;
                let quote = check_admission(pending.len() as u64, chunk_size, &state, &policy)?;
                if session.round() == 0 {
                    self.emit(TransferEvent::Admitted {
                        key: plan.key.clone(),
                        chunks: plan.total_chunks,
                        cost_estimate: quote.cost_estimate,
                    });
                }
            }

            let round = session.begin_round();
            debug!(key = %plan.key, round, pending = pending.len(), "upload round started");
            self.emit(TransferEvent::RoundStarted {
                key: plan.key.clone(),
                round,
                pending: pending.len() as u64,
            });

            let handles = self.submit_chunks(plan, &slices, &pending).await?;
            session.submitted();
            self.emit(TransferEvent::ChunksSubmitted {
                key: plan.key.clone(),
                round,
                submitted: handles.len() as u64,
            });

            if self.await_visibility(plan).await? {
                return Ok(());
            }

            let outcomes = self.resolve_handles(&handles).await?;
            for (order, outcome) in pending.iter().zip(&outcomes) {
                match outcome {
                    Some(CallOutcome::Rejected { code, message }) => {
                        debug!(key = %plan.key, order, code, %message, "chunk write rejected");
                    }
                    Some(CallOutcome::Replied(Err(e))) => {
                        debug!(key = %plan.key, order, error = %e, "chunk write refused");
                    }
                    _ => {}
                }
            }
            session.confirm(
                pending
                    .iter()
                    .zip(&outcomes)
                    .filter(|(_, outcome)| matches!(outcome, Some(o) if o.is_confirmed()))
                    .map(|(order, _)| *order),
            );

            if round > resends {
                return Err(EngineError::UploadIncomplete {
                    key: plan.key.clone(),
                    unconfirmed: session.pending_count(),
                });
            }
            warn!(
                key = %plan.key,
                round,
                confirmed = session.confirmed_count(),
                unconfirmed = session.pending_count(),
                "object not visible, resending unconfirmed chunks"
            );
        }
    }

    /// Submits the chunks at `orders`; handles come back in the same order.
    async fn submit_chunks(
        &self,
        plan: &ChunkPlan,
        slices: &[&[u8]],
        orders: &[u64],
    ) -> Result<Vec<CallHandle>, EngineError> {
        let submitter = self.store.submitter();
        let submitter = &submitter;
        let handles = self
            .executor()
            .run(orders.len(), |i| {
                let order = orders[i];
                let put = plan.file_put(order, slices[order as usize].to_vec());
                async move { submitter.submit(&put).await.map_err(EngineError::from) }
            })
            .await?;
        Ok(handles)
    }

    /// Polls for the object's metadata. Returns `false` if it never
    /// appeared within the attempt budget.
    async fn await_visibility(&self, plan: &ChunkPlan) -> Result<bool, EngineError> {
        let max_attempts = self.config.poll_attempts(plan.total_chunks);
        let interval = self.config.poll_interval();

        for attempt in 1..=max_attempts {
            tokio::time::sleep(interval).await;
            match self.store.asset_meta(&plan.key, Some(plan.kind)).await {
                Ok(_) => {
                    debug!(key = %plan.key, attempt, "object visible");
                    return Ok(true);
                }
                Err(TransportError::Store(StoreError::FileKeyErr)) => {}
                Err(e @ (TransportError::ChannelUnavailable(_) | TransportError::Certificate(_))) => {
                    warn!(key = %plan.key, attempt, error = %e, "visibility check failed");
                }
                Err(e) => return Err(e.into()),
            }
            self.emit(TransferEvent::ConfirmationPoll {
                key: plan.key.clone(),
                attempt,
                max_attempts,
            });
        }
        Ok(false)
    }

    /// Resolves every handle through the certified status path.
    ///
    /// A handle whose status could not be read within the retry budget
    /// comes back as `None` and counts as unconfirmed.
    async fn resolve_handles(
        &self,
        handles: &[CallHandle],
    ) -> Result<Vec<Option<CallOutcome<PutReply>>>, EngineError> {
        let poller = self.store.poller();
        let poller = &poller;
        let result = self
            .executor()
            .run(handles.len(), |i| {
                let handle = &handles[i];
                async move {
                    poller
                        .resolve::<PutReply>(handle)
                        .await
                        .map_err(EngineError::from)
                }
            })
            .await;

        match result {
            Ok(outcomes) => Ok(outcomes.into_iter().map(Some).collect()),
            Err(e) if e.kind == RetryErrorKind::Exhausted => {
                warn!(
                    unresolved = e.failed_indices().len(),
                    error = %e.last_error,
                    "some call statuses could not be read"
                );
                Ok(e.into_partial())
            }
            Err(e) => Err(e.into()),
        }
    }
}
