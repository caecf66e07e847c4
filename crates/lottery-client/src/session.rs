// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client session: the lock-step exchange with the aggregator.
//!
//! ```text
//! Disconnected -> Connected -> Sending -> AwaitingWinners -> AwaitingFinalAck -> Closed
//!        \             \           \              \                  \
//!         +-------------+-----------+--------------+------------------+--> Failed
//! ```
//!
//! Every batch must be acknowledged before the next one is packed. Once the
//! queue is empty the agency id is sent, the winners response is read and a
//! final ACK closes the exchange. Any error is fatal: the session moves to
//! `Failed` and the connection is closed.

use crate::bet::Bet;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::protocol::{BatchPacker, Frame, ACK_SIZE};
use crate::stats::SessionStats;
use crate::transport::Transport;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, error, info};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connected,
    Sending,
    AwaitingWinners,
    AwaitingFinalAck,
    Closed,
    Failed,
}

impl SessionState {
    /// `Closed` and `Failed` are absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Sending => "sending",
            Self::AwaitingWinners => "awaiting_winners",
            Self::AwaitingFinalAck => "awaiting_final_ack",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One agency's upload and winners query over a single connection.
pub struct ClientSession<S = TcpStream> {
    config: Arc<ClientConfig>,
    packer: BatchPacker,
    transport: Option<Transport<S>>,
    state: SessionState,
    pending: VecDeque<Bet>,
    winners: Vec<String>,
    stats: SessionStats,
}

impl<S> ClientSession<S> {
    /// Create a disconnected session holding the bets to upload.
    pub fn new(config: Arc<ClientConfig>, bets: impl IntoIterator<Item = Bet>) -> Self {
        let packer = BatchPacker::new(config.batch_max_amount, config.batch_max_bytes);
        Self {
            config,
            packer,
            transport: None,
            state: SessionState::Disconnected,
            pending: bets.into_iter().collect(),
            winners: Vec::new(),
            stats: SessionStats::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn agency(&self) -> &str {
        &self.config.id
    }

    /// Winners received so far (complete once the session is `Closed`).
    pub fn winners(&self) -> &[String] {
        &self.winners
    }

    /// Bets not yet acknowledged.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!(agency = %self.config.id, from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else if self.state.is_terminal() {
            Err(ClientError::SessionClosed)
        } else {
            Err(ClientError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}

impl ClientSession<TcpStream> {
    /// Open the TCP connection to the aggregator.
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(SessionState::Disconnected)?;

        match Transport::connect(&self.config.server_address, self.config.connect_timeout()).await
        {
            Ok(transport) => {
                info!(
                    agency = %self.config.id,
                    peer = %transport.peer(),
                    "connected to aggregator"
                );
                self.transport = Some(transport);
                self.set_state(SessionState::Connected);
                Ok(())
            }
            Err(e) => {
                error!(agency = %self.config.id, stage = "connect", error = %e, "connect failed");
                self.set_state(SessionState::Failed);
                Err(e)
            }
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> ClientSession<S> {
    /// Use an already connected stream as the transport.
    pub fn attach(&mut self, stream: S, peer: impl Into<String>) -> Result<()> {
        self.expect_state(SessionState::Disconnected)?;
        self.transport = Some(Transport::new(stream, peer));
        self.set_state(SessionState::Connected);
        Ok(())
    }

    /// Run the whole exchange and return the agency's winners.
    ///
    /// On error the session is `Failed` and the connection already closed.
    pub async fn run(&mut self) -> Result<&[String]> {
        self.expect_state(SessionState::Connected)?;
        info!(agency = %self.config.id, bets = self.pending.len(), "upload started");

        match self.exchange().await {
            Ok(()) => {
                self.shutdown_transport().await;
                self.set_state(SessionState::Closed);
                info!(
                    agency = %self.config.id,
                    winners = self.winners.len(),
                    stats = %self.stats,
                    "winners received"
                );
                Ok(&self.winners)
            }
            Err(e) => {
                error!(
                    agency = %self.config.id,
                    stage = %self.state,
                    error = %e,
                    "session failed"
                );
                self.set_state(SessionState::Failed);
                self.shutdown_transport().await;
                Err(e)
            }
        }
    }

    /// Close the connection if still open. Safe to call any number of times.
    ///
    /// A session stopped in the middle of the exchange ends up `Failed`.
    pub async fn stop(&mut self) {
        self.shutdown_transport().await;
        match self.state {
            SessionState::Sending
            | SessionState::AwaitingWinners
            | SessionState::AwaitingFinalAck => self.set_state(SessionState::Failed),
            SessionState::Disconnected | SessionState::Connected => {
                self.set_state(SessionState::Closed)
            }
            SessionState::Closed | SessionState::Failed => {}
        }
    }

    async fn exchange(&mut self) -> Result<()> {
        self.set_state(SessionState::Sending);
        self.send_bets().await?;

        self.set_state(SessionState::AwaitingWinners);
        self.query_winners().await?;

        self.set_state(SessionState::AwaitingFinalAck);
        self.recv_ack().await
    }

    async fn send_bets(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            // The aggregator only answers the winners query after a final batch.
            let frame = Frame::batch(&[], true).encode()?;
            self.transport_mut()?.write_all(&frame).await?;
            self.recv_ack().await?;
            self.stats.record_batch(0, frame.len());
            info!(agency = %self.config.id, "no bets to upload, sent empty final batch");
            return Ok(());
        }

        let delay = self.config.batch_delay();
        while !self.pending.is_empty() {
            let batch = self.packer.pack(self.pending.make_contiguous())?;

            self.transport_mut()?.write_all(&batch.frame).await?;
            self.recv_ack().await?;

            self.pending.drain(..batch.count);
            self.stats.record_batch(batch.count, batch.frame.len());
            debug!(
                agency = %self.config.id,
                bets = batch.count,
                bytes = batch.frame.len(),
                last = batch.last,
                remaining = self.pending.len(),
                "batch acknowledged"
            );

            if !self.pending.is_empty() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            agency = %self.config.id,
            bets = self.stats.bets_sent,
            batches = self.stats.batches_sent,
            rate = format!("{:.1}/s", self.stats.bets_per_second()),
            "all bets acknowledged"
        );
        Ok(())
    }

    async fn query_winners(&mut self) -> Result<()> {
        let announce = Frame::agency(&self.config.id).encode()?;

        let transport = self.transport_mut()?;
        transport.write_all(&announce).await?;
        let len = transport.read_exact(1).await?[0] as usize;
        let payload = transport.read_exact(len).await?;

        if let Frame::Winners(ids) = Frame::decode_winners(&payload)? {
            debug!(agency = %self.config.id, winners = ids.len(), "winners response");
            self.winners = ids;
        }
        Ok(())
    }

    async fn recv_ack(&mut self) -> Result<()> {
        let bytes = self.transport_mut()?.read_exact(ACK_SIZE).await?;
        Frame::decode_ack(&bytes)?;
        self.stats.record_ack();
        Ok(())
    }

    fn transport_mut(&mut self) -> Result<&mut Transport<S>> {
        let actual = self.state;
        self.transport.as_mut().ok_or(ClientError::InvalidState {
            expected: SessionState::Connected,
            actual,
        })
    }

    async fn shutdown_transport(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        if transport.close().await {
            self.stats.record_close();
            info!(agency = %self.config.id, peer = %transport.peer(), "connection closed");
        } else {
            debug!(agency = %self.config.id, "connection already closed");
        }
    }
}
