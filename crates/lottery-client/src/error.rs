// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the agency client.

use crate::config::ConfigError;
use crate::protocol::FrameError;
use crate::session::SessionState;
use thiserror::Error;

/// Main error type for all client operations.
///
/// Every variant is fatal for the session that raised it. There is no
/// automatic retry; callers restart the client wholesale.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport could not be established.
    #[error("Connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Write or read failed (or came up short) mid-session.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A batch cannot be built under the byte ceiling.
    #[error("Packing error: {0}")]
    Packing(String),

    /// Server answered something other than the expected literal.
    #[error("Protocol mismatch: expected {expected:?}, got {got:?}")]
    ProtocolMismatch { expected: String, got: String },

    /// Frame could not be encoded or decoded.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Bet rejected at construction.
    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    /// Bets file could not be read or has a malformed row.
    #[error("Bets file error: {0}")]
    BetsFile(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation not allowed in the session's current state.
    #[error("Session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// Operation attempted on a session that already terminated.
    #[error("Session closed")]
    SessionClosed,
}

impl ClientError {
    /// Build a mismatch error from the raw bytes actually received.
    pub fn mismatch(expected: &[u8], got: &[u8]) -> Self {
        Self::ProtocolMismatch {
            expected: String::from_utf8_lossy(expected).into_owned(),
            got: String::from_utf8_lossy(got).into_owned(),
        }
    }

    /// True when the peer closed the stream before a full frame arrived.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;
