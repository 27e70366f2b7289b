//! Certified status resolution for fire-and-forget calls.

use std::time::Duration;

use serde::de::DeserializeOwned;
use stowage_protocol::{CallHandle, PutReply, decode_reply};
use tracing::debug;

use crate::TransportError;
use crate::channel::{CallChannel, CertificateVerifier, StatePath};

/// Status leaf of a request in the certified state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Received,
    Processing,
    Replied,
    Rejected,
    /// The reply was already pruned from the tree.
    Done,
    /// No status leaf, or one this client does not recognise.
    Unknown,
}

impl RequestStatus {
    pub fn parse(label: &[u8]) -> Self {
        match label {
            b"received" => Self::Received,
            b"processing" => Self::Processing,
            b"replied" => Self::Replied,
            b"rejected" => Self::Rejected,
            b"done" => Self::Done,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processing => "processing",
            Self::Replied => "replied",
            Self::Rejected => "rejected",
            Self::Done => "done",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a certified read says about one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<R> {
    /// The call executed; `R` is the decoded reply, which may itself carry
    /// a business-level failure.
    Replied(R),
    /// The store refused to execute the call.
    Rejected { code: u64, message: String },
    /// No terminal status yet, or the status was lost.
    Pending(RequestStatus),
}

impl<R> CallOutcome<R> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

impl CallOutcome<PutReply> {
    /// Only a replied `Ok` confirms a write.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Replied(Ok(())))
    }
}

/// Resolves call handles through the certified read path.
pub struct StatusPoller<'a> {
    channel: &'a dyn CallChannel,
    verifier: &'a dyn CertificateVerifier,
}

impl<'a> StatusPoller<'a> {
    pub fn new(channel: &'a dyn CallChannel, verifier: &'a dyn CertificateVerifier) -> Self {
        Self { channel, verifier }
    }

    /// Reads and verifies the status of `handle` once.
    ///
    /// A `Replied` status is decoded with `R`, the declared return type of
    /// the original call.
    pub async fn resolve<R: DeserializeOwned>(
        &self,
        handle: &CallHandle,
    ) -> Result<CallOutcome<R>, TransportError> {
        let status_path = StatePath::request_status(handle, "status");
        let reply_path = StatePath::request_status(handle, "reply");
        let code_path = StatePath::request_status(handle, "reject_code");
        let message_path = StatePath::request_status(handle, "reject_message");

        let blob = self
            .channel
            .read_state(vec![
                status_path.clone(),
                reply_path.clone(),
                code_path.clone(),
                message_path.clone(),
            ])
            .await?;
        let state = self.verifier.verify(&blob)?;

        let status = state
            .lookup(&status_path)
            .map(RequestStatus::parse)
            .unwrap_or(RequestStatus::Unknown);
        debug!(handle = %handle, status = %status, "resolved call status");

        match status {
            RequestStatus::Replied => {
                let reply = state.lookup(&reply_path).ok_or_else(|| {
                    TransportError::Certificate(format!("{reply_path} missing for replied call"))
                })?;
                Ok(CallOutcome::Replied(decode_reply(reply)?))
            }
            RequestStatus::Rejected => {
                let code = state
                    .lookup(&code_path)
                    .and_then(decode_leb128)
                    .ok_or_else(|| {
                        TransportError::Certificate(format!(
                            "{code_path} missing or malformed for rejected call"
                        ))
                    })?;
                let message = state
                    .lookup(&message_path)
                    .map(|m| String::from_utf8_lossy(m).into_owned())
                    .unwrap_or_default();
                Ok(CallOutcome::Rejected { code, message })
            }
            other => Ok(CallOutcome::Pending(other)),
        }
    }

    /// Polls `handle` every `interval` until it is terminal.
    ///
    /// Rejections become [`TransportError::Rejected`]; still pending after
    /// `max_attempts` checks becomes [`TransportError::Unresolved`].
    pub async fn wait<R: DeserializeOwned>(
        &self,
        handle: &CallHandle,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<R, TransportError> {
        let max_attempts = max_attempts.max(1);
        let mut status = RequestStatus::Unknown;
        for attempt in 1..=max_attempts {
            match self.resolve(handle).await? {
                CallOutcome::Replied(reply) => return Ok(reply),
                CallOutcome::Rejected { code, message } => {
                    return Err(TransportError::Rejected { code, message });
                }
                CallOutcome::Pending(s) => status = s,
            }
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(TransportError::Unresolved {
            handle: handle.clone(),
            status,
            attempts: max_attempts,
        })
    }
}

/// Decodes an unsigned LEB128 integer that spans the whole input.
fn decode_leb128(bytes: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        let shift = 7 * i as u32;
        if shift >= 64 {
            return None;
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return (i + 1 == bytes.len()).then_some(value);
        }
    }
    None
}
