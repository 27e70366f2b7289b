use stowage_protocol::TransferKey;

/// Progress event emitted during an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Admission passed for the chunks about to be sent.
    Admitted {
        key: TransferKey,
        chunks: u64,
        cost_estimate: u128,
    },
    /// A submission round started over the still-pending chunks.
    RoundStarted {
        key: TransferKey,
        round: u32,
        pending: u64,
    },
    /// Every pending chunk of the round was accepted by the channel.
    ChunksSubmitted {
        key: TransferKey,
        round: u32,
        submitted: u64,
    },
    /// The object was not yet visible at this check.
    ConfirmationPoll {
        key: TransferKey,
        attempt: u64,
        max_attempts: u64,
    },
    /// The object is visible; the upload is done.
    Completed { key: TransferKey, chunks: u64 },
    /// The upload failed terminally.
    Failed { key: TransferKey, error: String },
}

impl TransferEvent {
    pub fn key(&self) -> &TransferKey {
        match self {
            Self::Admitted { key, .. }
            | Self::RoundStarted { key, .. }
            | Self::ChunksSubmitted { key, .. }
            | Self::ConfirmationPoll { key, .. }
            | Self::Completed { key, .. }
            | Self::Failed { key, .. } => key,
        }
    }
}
