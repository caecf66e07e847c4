// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lottery agency client
//!
//! Uploads an agency's bets to the lottery aggregator in size-bounded,
//! acknowledged batches, then asks for the agency's winners.
//!
//! # Exchange
//!
//! ```text
//! client                                   aggregator
//!   | -- batch (flag=0, count, bets) ------> |
//!   | <------------------------------ ACK\n  |
//!   |            ... one batch in flight ... |
//!   | -- batch (flag=1, count, bets) ------> |
//!   | <------------------------------ ACK\n  |
//!   | -- agency id ------------------------> |
//!   | <------------------ len, doc,doc,...   |
//!   | <------------------------------ ACK\n  |
//! ```
//!
//! # Quick Start
//!
//! ```bash
//! # Upload agency 3's bets
//! lottery-client --id 3 --server 127.0.0.1:12345 --bets agency-3.csv
//!
//! # Using a config file
//! lottery-client --config client.toml
//! ```
//!
//! # Library use
//!
//! ```no_run
//! use lottery_client::{BetSource, ClientConfig, ClientSession};
//! use std::sync::Arc;
//!
//! # async fn demo() -> lottery_client::Result<()> {
//! let config = Arc::new(ClientConfig::default());
//! let bets = BetSource::from_path("agency-1.csv", &config.id)?;
//!
//! let mut session = ClientSession::new(config, bets);
//! session.connect().await?;
//! let winners = session.run().await?;
//! println!("{} winners", winners.len());
//! # Ok(())
//! # }
//! ```

pub mod bet;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod source;
pub mod stats;
pub mod transport;

pub use bet::Bet;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use protocol::{BatchPacker, Frame, FrameError, PackedBatch};
pub use session::{ClientSession, SessionState};
pub use source::BetSource;
pub use stats::SessionStats;
pub use transport::Transport;
