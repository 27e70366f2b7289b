use crate::TransferError;

/// Longest accepted transfer key, in bytes.
pub const MAX_KEY_LEN: usize = 256;

/// Validates a caller-supplied transfer key.
///
/// Rejects:
/// - Empty or whitespace-only keys
/// - Keys longer than [`MAX_KEY_LEN`] bytes
/// - Control characters
pub fn validate_transfer_key(key: &str) -> Result<(), TransferError> {
    if key.trim().is_empty() {
        return Err(TransferError::InvalidKey("empty key".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(TransferError::InvalidKey(format!(
            "key is {} bytes, limit is {MAX_KEY_LEN}",
            key.len()
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(TransferError::InvalidKey(
            "control characters not allowed".into(),
        ));
    }
    Ok(())
}

/// Validates a listing page size against the store's limit.
pub fn validate_page_size(requested: u32, max: u32) -> Result<(), TransferError> {
    if requested > max {
        return Err(TransferError::PageSizeExceeded { requested, max });
    }
    Ok(())
}
