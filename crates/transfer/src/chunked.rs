use crate::TransferError;

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Number of chunks an object of `total_size` bytes splits into.
///
/// Never zero: an empty object still occupies one (empty) chunk so the
/// store has a metadata record for it.
pub fn chunk_count(total_size: u64, bound: usize) -> Result<u64, TransferError> {
    if bound == 0 {
        return Err(TransferError::InvalidChunkSize);
    }
    Ok(total_size.div_ceil(bound as u64).max(1))
}

/// Splits `data` into slices of at most `bound` bytes.
pub fn split(data: &[u8], bound: usize) -> Result<Chunks<'_>, TransferError> {
    if bound == 0 {
        return Err(TransferError::InvalidChunkSize);
    }
    Ok(Chunks {
        data,
        bound,
        offset: 0,
        done: false,
    })
}

/// Lazy, restartable sequence of chunk slices over an in-memory object.
///
/// Every slice except possibly the last is exactly `bound` bytes.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    data: &'a [u8],
    bound: usize,
    offset: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    /// Rewinds to byte 0.
    pub fn restart(&mut self) {
        self.offset = 0;
        self.done = false;
    }

    /// Byte offset of the next slice.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let end = (self.offset + self.bound).min(self.data.len());
        let slice = &self.data[self.offset..end];
        self.offset = end;
        if self.offset >= self.data.len() {
            self.done = true;
        }
        Some(slice)
    }
}

// ---------------------------------------------------------------------------
// Reassembly
// ---------------------------------------------------------------------------

/// Concatenates chunks by `order`, independent of arrival order.
///
/// `parts` must hold exactly `total_chunks` entries with dense, unique
/// orders. Each chunk lands at the cumulative length of all lower orders.
pub fn reassemble(parts: Vec<(u64, Vec<u8>)>, total_chunks: u64) -> Result<Vec<u8>, TransferError> {
    if parts.len() as u64 != total_chunks {
        return Err(TransferError::ChunkCountMismatch {
            expected: total_chunks,
            actual: parts.len() as u64,
        });
    }

    let mut slots: Vec<Option<Vec<u8>>> = (0..total_chunks).map(|_| None).collect();
    for (order, data) in parts {
        let slot = slots
            .get_mut(order as usize)
            .ok_or(TransferError::ChunkOutOfRange {
                order,
                total: total_chunks,
            })?;
        if slot.is_some() {
            return Err(TransferError::DuplicateChunk(order));
        }
        *slot = Some(data);
    }

    // Count matched and no duplicates, so every slot is filled.
    let total_len: usize = slots.iter().flatten().map(Vec::len).sum();
    let mut out = vec![0u8; total_len];
    let mut offset = 0;
    for data in slots.iter().flatten() {
        out[offset..offset + data.len()].copy_from_slice(data);
        offset += data.len();
    }
    Ok(out)
}
