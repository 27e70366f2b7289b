use std::collections::BTreeSet;
use std::time::Instant;

use stowage_protocol::{ChunkPut, FilePut, ObjectKind, StorageTier, TransferKey};

/// Per-object fields shared by every chunk of one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    pub key: TransferKey,
    pub kind: ObjectKind,
    pub tier: StorageTier,
    pub total_chunks: u64,
    pub total_size: u64,
    pub media_type: String,
    pub file_name: String,
    pub is_private: bool,
    /// Wrapped symmetric key material, carried by chunk 0 only.
    pub wrapped_key: Option<Vec<u8>>,
}

impl ChunkPlan {
    /// Builds the chunk record for `order`.
    pub fn chunk(&self, order: u64, payload: Vec<u8>) -> ChunkPut {
        ChunkPut {
            key: self.key.clone(),
            order,
            total_chunks: self.total_chunks,
            total_size: self.total_size,
            data: payload,
            wrapped_key: if order == 0 {
                self.wrapped_key.clone()
            } else {
                None
            },
            is_private: self.is_private,
            media_type: self.media_type.clone(),
            file_name: self.file_name.clone(),
        }
    }

    /// Wraps the chunk for `order` into the store's `put` argument.
    pub fn file_put(&self, order: u64, payload: Vec<u8>) -> FilePut {
        FilePut {
            kind: self.kind,
            tier: self.tier,
            chunk: self.chunk(order, payload),
        }
    }
}

/// Upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Admitted,
    Submitting,
    Confirming,
    Done,
    Failed,
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Tracks one upload across submission rounds.
///
/// Owned by the single task driving the upload, so transitions take
/// `&mut self` and need no locking.
#[derive(Debug)]
pub struct UploadSession {
    key: TransferKey,
    total_chunks: u64,
    phase: UploadPhase,
    round: u32,
    pending: BTreeSet<u64>,
    started_at: Instant,
    completed_at: Option<Instant>,
    error: Option<String>,
}

impl UploadSession {
    /// Creates an admitted session with every chunk pending.
    pub fn new(key: TransferKey, total_chunks: u64) -> Self {
        Self {
            key,
            total_chunks,
            phase: UploadPhase::Admitted,
            round: 0,
            pending: (0..total_chunks).collect(),
            started_at: Instant::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Starts a submission round over the current pending set.
    pub fn begin_round(&mut self) -> u32 {
        self.round += 1;
        self.phase = UploadPhase::Submitting;
        self.round
    }

    /// All pending chunks were submitted; waiting for confirmation.
    pub fn submitted(&mut self) {
        self.phase = UploadPhase::Confirming;
    }

    /// Records the chunks whose write is confirmed.
    pub fn confirm<I: IntoIterator<Item = u64>>(&mut self, orders: I) {
        for order in orders {
            self.pending.remove(&order);
        }
    }

    /// The object became visible: every chunk is confirmed.
    pub fn complete(&mut self) {
        self.pending.clear();
        self.phase = UploadPhase::Done;
        self.completed_at = Some(Instant::now());
    }

    pub fn fail(&mut self, err: impl Into<String>) {
        self.phase = UploadPhase::Failed;
        self.error = Some(err.into());
        self.completed_at = Some(Instant::now());
    }

    pub fn key(&self) -> &TransferKey {
        &self.key
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Pending chunk orders, ascending.
    pub fn pending(&self) -> Vec<u64> {
        self.pending.iter().copied().collect()
    }

    pub fn pending_count(&self) -> u64 {
        self.pending.len() as u64
    }

    pub fn confirmed_count(&self) -> u64 {
        self.total_chunks - self.pending_count()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Wall time from admission to completion (or now, if still running).
    pub fn elapsed(&self) -> std::time::Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_protocol::MEDIA_BYTES;

    fn plan(wrapped: Option<Vec<u8>>) -> ChunkPlan {
        ChunkPlan {
            key: "obj-1".into(),
            kind: ObjectKind::Encrypted,
            tier: StorageTier::Ic,
            total_chunks: 3,
            total_size: 10,
            media_type: MEDIA_BYTES.into(),
            file_name: String::new(),
            is_private: true,
            wrapped_key: wrapped,
        }
    }

    #[test]
    fn wrapped_key_only_on_first_chunk() {
        let plan = plan(Some(vec![9; 4]));
        assert_eq!(plan.chunk(0, vec![1]).wrapped_key, Some(vec![9; 4]));
        assert_eq!(plan.chunk(1, vec![2]).wrapped_key, None);
        assert_eq!(plan.chunk(2, vec![3]).wrapped_key, None);
    }

    #[test]
    fn chunks_share_object_fields() {
        let plan = plan(None);
        let put = plan.file_put(2, b"xy".to_vec());
        assert_eq!(put.kind, ObjectKind::Encrypted);
        assert_eq!(put.tier, StorageTier::Ic);
        assert_eq!(put.chunk.key.as_str(), "obj-1");
        assert_eq!(put.chunk.order, 2);
        assert_eq!(put.chunk.total_chunks, 3);
        assert_eq!(put.chunk.total_size, 10);
        assert!(put.chunk.is_private);
        assert_eq!(put.chunk.data, b"xy");
    }

    #[test]
    fn new_session_has_everything_pending() {
        let session = UploadSession::new("k".into(), 3);
        assert_eq!(session.phase(), UploadPhase::Admitted);
        assert_eq!(session.pending(), vec![0, 1, 2]);
        assert_eq!(session.confirmed_count(), 0);
        assert_eq!(session.round(), 0);
    }

    #[test]
    fn rounds_shrink_the_pending_set() {
        let mut session = UploadSession::new("k".into(), 3);
        assert_eq!(session.begin_round(), 1);
        assert_eq!(session.phase(), UploadPhase::Submitting);
        session.submitted();
        assert_eq!(session.phase(), UploadPhase::Confirming);

        session.confirm([0, 1]);
        assert_eq!(session.pending(), vec![2]);
        assert_eq!(session.confirmed_count(), 2);

        assert_eq!(session.begin_round(), 2);
        session.confirm([7]);
        assert_eq!(session.pending(), vec![2]);

        session.complete();
        assert_eq!(session.phase(), UploadPhase::Done);
        assert!(session.phase().is_terminal());
        assert_eq!(session.confirmed_count(), 3);
    }

    #[test]
    fn fail_records_error() {
        let mut session = UploadSession::new("k".into(), 1);
        session.begin_round();
        session.fail("budget exhausted");
        assert_eq!(session.phase(), UploadPhase::Failed);
        assert_eq!(session.error(), Some("budget exhausted"));
        assert_eq!(session.pending_count(), 1);
    }
}
