// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire frames exchanged with the aggregator.
//!
//! ```text
//! Batch    : | flag (1B) | count (1B) | bet 1 | ... | bet N |
//! Agency   : | raw ASCII agency id |
//! Ack      : | "ACK\n" |
//! Winners  : | len (1B) | doc,doc,... (len bytes) |
//! ```
//!
//! There are no transport-level message boundaries: both sides know the
//! size of `Ack` and `Agency` frames in advance, everything else carries its
//! own length or count.

use crate::bet::{Bet, SEPARATOR};
use crate::error::{ClientError, Result};
use thiserror::Error;

/// Acknowledgment literal sent by the aggregator.
pub const ACK: &[u8; 4] = b"ACK\n";

/// Size of [`ACK`] on the wire.
pub const ACK_SIZE: usize = ACK.len();

/// `flag` + `count`.
pub const BATCH_HEADER_SIZE: usize = 2;

/// Record count travels in a single byte.
pub const MAX_BATCH_RECORDS: usize = u8::MAX as usize;

/// Winners payload length travels in a single byte.
pub const MAX_WINNERS_PAYLOAD: usize = u8::MAX as usize;

/// Batch flag values.
pub mod flags {
    /// More batches follow from this agency.
    pub const MORE: u8 = 0;
    /// Last batch of this agency.
    pub const FINAL: u8 = 1;
}

/// Frame-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("batch holds {0} records, at most {max} fit the count byte", max = MAX_BATCH_RECORDS)]
    TooManyRecords(usize),

    #[error("winners payload is {0} bytes, at most {max} fit the length byte", max = MAX_WINNERS_PAYLOAD)]
    WinnersTooLarge(usize),

    #[error("agency id {0:?} must be non-empty ASCII")]
    InvalidAgency(String),

    #[error("unknown batch flag {0}")]
    InvalidFlag(u8),

    #[error("winners payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A protocol frame.
///
/// Outbound frames borrow from the session (bets stay in the pending queue
/// until acknowledged); inbound frames own their data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A run of bets, `last` set on the agency's final batch.
    Batch { last: bool, bets: &'a [Bet] },

    /// End-of-upload marker carrying the agency id.
    Agency(&'a str),

    /// Server acknowledgment.
    Ack,

    /// Document ids of this agency's winning bets.
    Winners(Vec<String>),
}

impl<'a> Frame<'a> {
    /// Batch frame over a run of bets.
    pub fn batch(bets: &'a [Bet], last: bool) -> Self {
        Self::Batch { last, bets }
    }

    /// Agency-id control frame.
    pub fn agency(id: &'a str) -> Self {
        Self::Agency(id)
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Batch { .. } => "batch",
            Self::Agency(_) => "agency",
            Self::Ack => "ack",
            Self::Winners(_) => "winners",
        }
    }

    /// Encoded size in bytes, computed without encoding.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Batch { bets, .. } => {
                BATCH_HEADER_SIZE + bets.iter().map(Bet::encoded_len).sum::<usize>()
            }
            Self::Agency(id) => id.len(),
            Self::Ack => ACK_SIZE,
            Self::Winners(ids) => 1 + winners_payload_len(ids),
        }
    }

    /// Encode the frame for the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());

        match self {
            Self::Batch { last, bets } => {
                if bets.len() > MAX_BATCH_RECORDS {
                    return Err(FrameError::TooManyRecords(bets.len()).into());
                }
                buf.push(if *last { flags::FINAL } else { flags::MORE });
                buf.push(bets.len() as u8);
                for bet in bets.iter() {
                    bet.encode_into(&mut buf)?;
                }
            }
            Self::Agency(id) => {
                if id.is_empty() || !id.is_ascii() {
                    return Err(FrameError::InvalidAgency(id.to_string()).into());
                }
                buf.extend_from_slice(id.as_bytes());
            }
            Self::Ack => buf.extend_from_slice(ACK),
            Self::Winners(ids) => {
                let payload = ids.join(SEPARATOR.to_string().as_str());
                if payload.len() > MAX_WINNERS_PAYLOAD {
                    return Err(FrameError::WinnersTooLarge(payload.len()).into());
                }
                buf.push(payload.len() as u8);
                buf.extend_from_slice(payload.as_bytes());
            }
        }

        Ok(buf)
    }
}

impl Frame<'static> {
    /// Decode an acknowledgment. Anything but [`ACK`] is a protocol mismatch.
    pub fn decode_ack(bytes: &[u8]) -> Result<Self> {
        if bytes == ACK {
            Ok(Self::Ack)
        } else {
            Err(ClientError::mismatch(ACK, bytes))
        }
    }

    /// Decode a winners payload (the bytes after the length byte).
    ///
    /// An empty payload means no winners.
    pub fn decode_winners(payload: &[u8]) -> std::result::Result<Self, FrameError> {
        let text = std::str::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8)?;
        let ids = if text.is_empty() {
            Vec::new()
        } else {
            text.split(SEPARATOR).map(str::to_string).collect()
        };
        Ok(Self::Winners(ids))
    }
}

/// Decode a batch flag byte.
pub fn decode_flag(flag: u8) -> std::result::Result<bool, FrameError> {
    match flag {
        flags::MORE => Ok(false),
        flags::FINAL => Ok(true),
        other => Err(FrameError::InvalidFlag(other)),
    }
}

fn winners_payload_len(ids: &[String]) -> usize {
    let text: usize = ids.iter().map(String::len).sum();
    text + ids.len().saturating_sub(1) * SEPARATOR.len_utf8()
}
