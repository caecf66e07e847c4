// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bet record and its wire encoding.
//!
//! Wire format:
//! ```text
//! +----------------+--------------------------------------------------+
//! | Length (4B BE) | agency,first_name,last_name,document,birth,number |
//! +----------------+--------------------------------------------------+
//! ```
//!
//! The separator is not escaped. Field values must not contain it; this is
//! a constraint on the input data and is not checked here.

use crate::error::{ClientError, Result};
use std::env;
use std::fmt;

/// Field separator inside an encoded bet (and inside the winners payload).
pub const SEPARATOR: char = ',';

/// Size of the big-endian length prefix in front of every bet.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Environment variables read by [`Bet::from_env`].
pub const ENV_FIRST_NAME: &str = "FIRST_NAME";
pub const ENV_LAST_NAME: &str = "LAST_NAME";
pub const ENV_DOCUMENT: &str = "DOCUMENT";
pub const ENV_BIRTHDATE: &str = "BIRTHDATE";
pub const ENV_NUMBER: &str = "NUMBER";

/// A single lottery bet placed at an agency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    agency: String,
    first_name: String,
    last_name: String,
    document: String,
    birthdate: String,
    number: String,
}

impl Bet {
    /// Create a bet. Every field must be non-empty.
    pub fn new(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        document: impl Into<String>,
        birthdate: impl Into<String>,
        number: impl Into<String>,
    ) -> Result<Self> {
        let bet = Self {
            agency: agency.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            document: document.into(),
            birthdate: birthdate.into(),
            number: number.into(),
        };

        if let Some(name) = bet.first_empty_field() {
            return Err(ClientError::InvalidBet(format!("field '{}' is empty", name)));
        }
        Ok(bet)
    }

    /// Build a single bet for `agency` from the process environment.
    pub fn from_env(agency: &str) -> Result<Self> {
        let get = |key: &str| env::var(key).unwrap_or_default();
        Self::new(
            agency,
            get(ENV_FIRST_NAME),
            get(ENV_LAST_NAME),
            get(ENV_DOCUMENT),
            get(ENV_BIRTHDATE),
            get(ENV_NUMBER),
        )
        .map_err(|e| ClientError::InvalidBet(format!("from environment: {}", e)))
    }

    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("agency", self.agency.as_str()),
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("document", self.document.as_str()),
            ("birthdate", self.birthdate.as_str()),
            ("number", self.number.as_str()),
        ]
    }

    fn first_empty_field(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn birthdate(&self) -> &str {
        &self.birthdate
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    /// Length of the joined payload (without the length prefix).
    pub fn payload_len(&self) -> usize {
        let text: usize = self.fields().iter().map(|(_, v)| v.len()).sum();
        text + 5 * SEPARATOR.len_utf8()
    }

    /// Full encoded length, length prefix included.
    pub fn encoded_len(&self) -> usize {
        LEN_PREFIX_SIZE + self.payload_len()
    }

    /// Append the encoded bet to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let len = u32::try_from(self.payload_len()).map_err(|_| {
            ClientError::InvalidBet(format!(
                "encoded bet exceeds {} bytes (document {})",
                u32::MAX,
                self.document
            ))
        })?;

        buf.reserve(LEN_PREFIX_SIZE + len as usize);
        buf.extend_from_slice(&len.to_be_bytes());
        for (i, (_, value)) in self.fields().iter().enumerate() {
            if i > 0 {
                let mut sep = [0u8; 4];
                buf.extend_from_slice(SEPARATOR.encode_utf8(&mut sep).as_bytes());
            }
            buf.extend_from_slice(value.as_bytes());
        }
        Ok(())
    }

    /// Encode the bet as `len:u32 BE | payload`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Parse a joined payload (no length prefix) back into a bet.
    ///
    /// The client never receives bets; this exists for tooling and tests.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| ClientError::InvalidBet(format!("payload is not UTF-8: {}", e)))?;
        let parts: Vec<&str> = text.split(SEPARATOR).collect();
        if parts.len() != 6 {
            return Err(ClientError::InvalidBet(format!(
                "expected 6 fields, got {}",
                parts.len()
            )));
        }
        Self::new(parts[0], parts[1], parts[2], parts[3], parts[4], parts[5])
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.agency,
            self.first_name,
            self.last_name,
            self.document,
            self.birthdate,
            self.number
        )
    }
}
