// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session statistics.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one client session.
///
/// The session is the only owner, so plain integers are enough.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Batches acknowledged by the aggregator.
    pub batches_sent: u64,

    /// Bets inside acknowledged batches.
    pub bets_sent: u64,

    /// Batch frame bytes acknowledged.
    pub bytes_sent: u64,

    /// ACK literals received (batches plus the final one).
    pub acks_received: u64,

    /// Times the connection was actually shut down.
    pub connections_closed: u64,

    /// Session creation time.
    pub created: Instant,
}

impl SessionStats {
    /// Create new stats.
    pub fn new() -> Self {
        Self {
            batches_sent: 0,
            bets_sent: 0,
            bytes_sent: 0,
            acks_received: 0,
            connections_closed: 0,
            created: Instant::now(),
        }
    }

    /// Record an acknowledged batch.
    pub fn record_batch(&mut self, bets: usize, bytes: usize) {
        self.batches_sent += 1;
        self.bets_sent += bets as u64;
        self.bytes_sent += bytes as u64;
    }

    /// Record a received ACK.
    pub fn record_ack(&mut self) {
        self.acks_received += 1;
    }

    /// Record a connection shutdown.
    pub fn record_close(&mut self) {
        self.connections_closed += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    /// Calculate bets per second since creation.
    pub fn bets_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bets_sent as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bets in {} batches, {} bytes, {} acks",
            self.bets_sent, self.batches_sent, self.bytes_sent, self.acks_received
        )
    }
}
