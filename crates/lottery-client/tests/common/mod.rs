// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scripted aggregator side of the protocol, for tests.

#![allow(dead_code)]

use lottery_client::protocol::frame::decode_flag;
use lottery_client::{Bet, Frame};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bets whose number equals this one win.
pub const WINNING_NUMBER: &str = "4540";

/// A batch as seen by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedBatch {
    pub last: bool,
    pub bets: Vec<Bet>,
}

/// Read one batch frame and parse its bets.
pub async fn read_batch<R: AsyncRead + Unpin>(stream: &mut R) -> std::io::Result<ReceivedBatch> {
    let flag = stream.read_u8().await?;
    let count = stream.read_u8().await?;
    let last = decode_flag(flag)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut bets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = stream.read_u32().await? as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await?;
        let bet = Bet::parse(&payload)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        bets.push(bet);
    }

    Ok(ReceivedBatch { last, bets })
}

pub async fn send_ack<W: AsyncWrite + Unpin>(stream: &mut W) -> std::io::Result<()> {
    stream.write_all(&Frame::Ack.encode().unwrap()).await
}

pub async fn send_winners<W: AsyncWrite + Unpin>(
    stream: &mut W,
    winners: &[String],
) -> std::io::Result<()> {
    let frame = Frame::Winners(winners.to_vec()).encode().unwrap();
    stream.write_all(&frame).await
}

/// Read the agency id announcement (`len` bytes of ASCII).
pub async fn read_agency<R: AsyncRead + Unpin>(
    stream: &mut R,
    len: usize,
) -> std::io::Result<String> {
    let mut id = vec![0u8; len];
    stream.read_exact(&mut id).await?;
    String::from_utf8(id).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Transcript of a well-behaved aggregator run.
#[derive(Debug, Default)]
pub struct Transcript {
    pub batches: Vec<ReceivedBatch>,
    pub agency: String,
    pub winners: Vec<String>,
}

/// Accept batches until the final one, then answer the winners query.
///
/// Winners are the documents of received bets carrying [`WINNING_NUMBER`].
pub async fn serve_agency<S: AsyncRead + AsyncWrite + Unpin>(
    mut stream: S,
    agency_len: usize,
) -> std::io::Result<Transcript> {
    let mut transcript = Transcript::default();

    loop {
        let batch = read_batch(&mut stream).await?;
        send_ack(&mut stream).await?;
        let last = batch.last;
        transcript.batches.push(batch);
        if last {
            break;
        }
    }

    transcript.agency = read_agency(&mut stream, agency_len).await?;
    transcript.winners = transcript
        .batches
        .iter()
        .flat_map(|b| b.bets.iter())
        .filter(|bet| bet.number() == WINNING_NUMBER)
        .map(|bet| bet.document().to_string())
        .collect();

    send_winners(&mut stream, &transcript.winners).await?;
    send_ack(&mut stream).await?;
    Ok(transcript)
}

/// Bets for `agency`; every `winner_every`-th one plays the winning number.
pub fn make_bets(agency: &str, n: usize, winner_every: usize) -> Vec<Bet> {
    (0..n)
        .map(|i| {
            let number = if winner_every > 0 && i % winner_every == 0 {
                WINNING_NUMBER.to_string()
            } else {
                format!("{}", 1000 + i)
            };
            Bet::new(
                agency,
                format!("Name{}", i),
                format!("Surname{}", i),
                format!("{}", 30_000_000 + i),
                "1990-01-01",
                number,
            )
            .unwrap()
        })
        .collect()
}

pub fn config(id: &str, max_amount: usize, max_bytes: usize) -> Arc<lottery_client::ClientConfig> {
    Arc::new(lottery_client::ClientConfig {
        id: id.into(),
        batch_max_amount: max_amount,
        batch_max_bytes: max_bytes,
        ..Default::default()
    })
}
