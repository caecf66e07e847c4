// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Full-write / full-read transport over a byte stream.
//!
//! A single `write` or `read` call may move fewer bytes than requested.
//! [`Transport::write_all`] and [`Transport::read_exact`] keep going until
//! the whole count is transferred or the stream fails; a short transfer is
//! always an error, never a truncated buffer.

use crate::error::{ClientError, Result};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// An exclusively owned connection to the aggregator.
pub struct Transport<S> {
    stream: S,
    peer: String,
    closed: bool,
    bytes_written: u64,
    bytes_read: u64,
}

impl Transport<TcpStream> {
    /// Open a TCP connection to `addr`.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let connect_err = |source: io::Error| ClientError::Connect {
            addr: addr.to_string(),
            source,
        };

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                connect_err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no answer within {:?}", timeout),
                ))
            })?
            .map_err(connect_err)?;

        // Lock-step request/ack: do not let Nagle hold back small frames.
        stream.set_nodelay(true).map_err(connect_err)?;

        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.to_string());
        debug!(peer = %peer, "connected");

        Ok(Self::new(stream, peer))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Transport<S> {
    /// Wrap an already connected stream.
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
            closed: false,
            bytes_written: 0,
            bytes_read: 0,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Write every byte of `buf`, then flush.
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ClientError::SessionClosed);
        }

        let mut written = 0;
        while written < buf.len() {
            let n = self.stream.write(&buf[written..]).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!(
                        "peer stopped accepting data after {} of {} bytes",
                        written,
                        buf.len()
                    ),
                )
                .into());
            }
            written += n;
            trace!(n, written, total = buf.len(), "partial write");
        }
        self.stream.flush().await?;

        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `n` bytes.
    ///
    /// A zero-byte read before `n` bytes arrived means the peer closed the
    /// stream and fails with `UnexpectedEof`.
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.closed {
            return Err(ClientError::SessionClosed);
        }

        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let got = self.stream.read(&mut buf[filled..]).await?;
            if got == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {} of {} bytes", filled, n),
                )
                .into());
            }
            filled += got;
            trace!(got, filled, total = n, "partial read");
        }

        self.bytes_read += n as u64;
        Ok(buf)
    }

    /// Shut the stream down.
    ///
    /// Returns `false` if it was already closed. A failing shutdown still
    /// marks the transport closed.
    pub async fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;

        if let Err(e) = self.stream.shutdown().await {
            warn!(peer = %self.peer, error = %e, "shutdown failed");
        }
        true
    }
}
