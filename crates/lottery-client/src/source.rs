// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bets file reader.
//!
//! One bet per line, five comma separated fields:
//! `first_name,last_name,document,birthdate,number`. The agency id comes
//! from configuration, not from the file.

use crate::bet::{Bet, SEPARATOR};
use crate::error::{ClientError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Number of fields in a bets file row.
pub const ROW_FIELDS: usize = 5;

/// Reads an agency's bets from a file or any reader.
pub struct BetSource;

impl BetSource {
    /// Read all bets from `path`.
    pub fn from_path<P: AsRef<Path>>(path: P, agency: &str) -> Result<Vec<Bet>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ClientError::BetsFile(format!("cannot open {}: {}", path.display(), e))
        })?;
        let bets = Self::from_reader(file, agency)?;
        debug!(path = %path.display(), bets = bets.len(), "bets file loaded");
        Ok(bets)
    }

    /// Read all bets from `reader`. Blank lines are skipped.
    pub fn from_reader<R: Read>(reader: R, agency: &str) -> Result<Vec<Bet>> {
        let mut bets = Vec::new();

        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line_no = idx + 1;
            let line = line
                .map_err(|e| ClientError::BetsFile(format!("line {}: {}", line_no, e)))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            bets.push(Self::parse_row(line, agency, line_no)?);
        }

        Ok(bets)
    }

    fn parse_row(line: &str, agency: &str, line_no: usize) -> Result<Bet> {
        let fields: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
        if fields.len() != ROW_FIELDS {
            return Err(ClientError::BetsFile(format!(
                "line {}: expected {} fields, got {}",
                line_no,
                ROW_FIELDS,
                fields.len()
            )));
        }

        Bet::new(agency, fields[0], fields[1], fields[2], fields[3], fields[4])
            .map_err(|e| ClientError::BetsFile(format!("line {}: {}", line_no, e)))
    }
}
