// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch packing under a byte ceiling.
//!
//! A batch is the longest prefix of the pending bets (up to the record
//! limit) whose encoded frame fits in `max_bytes`. When the candidate
//! overflows it shrinks to three quarters of its size and is measured again,
//! so an oversized candidate converges in O(log n) attempts.

use super::frame::{Frame, BATCH_HEADER_SIZE, MAX_BATCH_RECORDS};
use crate::bet::Bet;
use crate::error::{ClientError, Result};
use tracing::trace;

/// Next candidate size after an overflow.
#[inline]
pub fn shrink(count: usize) -> usize {
    count * 3 / 4
}

/// Size of a batch frame holding bets of the given encoded sizes.
pub fn batch_len(sizes: &[usize]) -> usize {
    BATCH_HEADER_SIZE + sizes.iter().sum::<usize>()
}

/// Decide how many bets from the head of the queue form the next batch.
///
/// `sizes` are the encoded sizes of the pending bets, in queue order. Pure
/// function: no I/O, same answer for the same inputs.
pub fn plan_batch(sizes: &[usize], max_records: usize, max_bytes: usize) -> Result<usize> {
    if sizes.is_empty() {
        return Err(ClientError::Packing("no bets pending".into()));
    }

    let mut count = sizes.len().min(max_records).min(MAX_BATCH_RECORDS);
    if count == 0 {
        return Err(ClientError::Packing(
            "record limit per batch must be at least 1".into(),
        ));
    }

    loop {
        let len = batch_len(&sizes[..count]);
        if len <= max_bytes {
            return Ok(count);
        }

        let next = shrink(count);
        trace!(count, len, max_bytes, next, "batch candidate overflows");
        if next < 1 {
            return Err(ClientError::Packing(format!(
                "batch too small: {} bet(s) need {} bytes, ceiling is {}",
                count, len, max_bytes
            )));
        }
        count = next;
    }
}

/// A batch ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBatch {
    /// Number of bets consumed from the head of the queue.
    pub count: usize,
    /// True when the batch empties the queue.
    pub last: bool,
    /// Encoded batch frame.
    pub frame: Vec<u8>,
}

/// Packs pending bets into size-bounded batch frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPacker {
    max_records: usize,
    max_bytes: usize,
}

impl BatchPacker {
    /// Create a packer with per-batch record and byte ceilings.
    pub fn new(max_records: usize, max_bytes: usize) -> Self {
        Self {
            max_records,
            max_bytes,
        }
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Build the next batch from the head of `pending`.
    ///
    /// Nothing is removed from `pending`; the caller drops `count` bets once
    /// the batch is acknowledged.
    pub fn pack(&self, pending: &[Bet]) -> Result<PackedBatch> {
        let window = pending.len().min(self.max_records).min(MAX_BATCH_RECORDS);
        let sizes: Vec<usize> = pending[..window].iter().map(Bet::encoded_len).collect();

        let count = plan_batch(&sizes, self.max_records, self.max_bytes)?;
        let last = count == pending.len();
        let frame = Frame::batch(&pending[..count], last).encode()?;
        debug_assert!(frame.len() <= self.max_bytes);

        Ok(PackedBatch { count, last, frame })
    }
}
