use stowage_protocol::{CallHandle, FilePut, StoreMethod, encode_args};
use tracing::debug;

use crate::TransportError;
use crate::channel::CallChannel;

/// Wraps one chunk write as a fire-and-forget `put` call.
///
/// No retry happens here: a channel failure surfaces to the caller, which
/// is expected to run submissions through the retry executor.
pub struct CallSubmitter<'a> {
    channel: &'a dyn CallChannel,
}

impl<'a> CallSubmitter<'a> {
    pub fn new(channel: &'a dyn CallChannel) -> Self {
        Self { channel }
    }

    /// Encodes `put` and issues the call. Returns as soon as the store
    /// accepted the call, without knowing whether the write succeeded.
    pub async fn submit(&self, put: &FilePut) -> Result<CallHandle, TransportError> {
        let args = encode_args(put)?;
        let handle = self.channel.call(StoreMethod::Put, args).await?;
        debug!(
            key = %put.chunk.key,
            order = put.chunk.order,
            handle = %handle,
            "chunk submitted"
        );
        Ok(handle)
    }
}
