// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client configuration.
//!
//! Layers, lowest priority first:
//! 1. built-in defaults
//! 2. a configuration file (TOML, or JSON when the extension is `.json`)
//! 3. environment variables (`CLI_*`)
//! 4. command-line flags (applied by the binary)
//!
//! The resulting [`ClientConfig`] is created once at startup and shared
//! read-only with the session.

use crate::bet::SEPARATOR;
use crate::protocol::{BATCH_HEADER_SIZE, MAX_BATCH_RECORDS};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable names.
pub const ENV_ID: &str = "CLI_ID";
pub const ENV_SERVER_ADDRESS: &str = "CLI_SERVER_ADDRESS";
pub const ENV_BATCH_MAX_AMOUNT: &str = "CLI_BATCH_MAX_AMOUNT";
pub const ENV_BATCH_MAX_BYTES: &str = "CLI_BATCH_MAX_BYTES";
pub const ENV_BATCH_DELAY_MS: &str = "CLI_BATCH_DELAY_MS";
pub const ENV_BETS_FILE: &str = "CLI_BETS_FILE";
pub const ENV_LOG_LEVEL: &str = "CLI_LOG_LEVEL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Agency client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Agency id, sent as the end-of-upload marker.
    #[serde(default = "default_id")]
    pub id: String,

    /// Aggregator address (`host:port`).
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Maximum bets per batch.
    #[serde(default = "default_batch_max_amount")]
    pub batch_max_amount: usize,

    /// Maximum encoded size of a batch frame (bytes).
    #[serde(default = "default_batch_max_bytes")]
    pub batch_max_bytes: usize,

    /// Pause between acknowledged batches (milliseconds).
    #[serde(default)]
    pub batch_delay_ms: u64,

    /// Bets file for this agency. Without it a single bet is read from the
    /// environment.
    #[serde(default)]
    pub bets_file: Option<PathBuf>,

    /// Log level / filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connection timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_id() -> String {
    "1".to_string()
}

fn default_server_address() -> String {
    "127.0.0.1:12345".to_string()
}

fn default_batch_max_amount() -> usize {
    50
}

fn default_batch_max_bytes() -> usize {
    8 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            server_address: default_server_address(),
            batch_max_amount: default_batch_max_amount(),
            batch_max_bytes: default_batch_max_bytes(),
            batch_delay_ms: 0,
            bets_file: None,
            log_level: default_log_level(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a file. `.json` files are parsed as JSON,
    /// anything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config)
    }

    /// Save configuration as TOML.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from `CLI_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get(ENV_ID) {
            self.id = id.trim().to_string();
        }
        if let Some(addr) = get(ENV_SERVER_ADDRESS) {
            self.server_address = addr.trim().to_string();
        }
        if let Some(v) = get(ENV_BATCH_MAX_AMOUNT) {
            self.batch_max_amount = parse_var(ENV_BATCH_MAX_AMOUNT, &v)?;
        }
        if let Some(v) = get(ENV_BATCH_MAX_BYTES) {
            self.batch_max_bytes = parse_var(ENV_BATCH_MAX_BYTES, &v)?;
        }
        if let Some(v) = get(ENV_BATCH_DELAY_MS) {
            self.batch_delay_ms = parse_var(ENV_BATCH_DELAY_MS, &v)?;
        }
        if let Some(path) = get(ENV_BETS_FILE) {
            self.bets_file = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level.trim().to_lowercase();
        }
        Ok(())
    }

    /// Pause between batches as Duration.
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Connection timeout as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::Invalid("id cannot be empty".into()));
        }
        if !self.id.is_ascii() || self.id.contains(SEPARATOR) {
            return Err(ConfigError::Invalid(format!(
                "id {:?} must be ASCII without '{}'",
                self.id, SEPARATOR
            )));
        }
        if self.server_address.is_empty() {
            return Err(ConfigError::Invalid("server_address cannot be empty".into()));
        }
        if self.batch_max_amount == 0 || self.batch_max_amount > MAX_BATCH_RECORDS {
            return Err(ConfigError::Invalid(format!(
                "batch_max_amount must be within 1..={}, got {}",
                MAX_BATCH_RECORDS, self.batch_max_amount
            )));
        }
        // Header plus one length prefix is the smallest frame that can carry a bet.
        let min_bytes = BATCH_HEADER_SIZE + crate::bet::LEN_PREFIX_SIZE;
        if self.batch_max_bytes < min_bytes {
            return Err(ConfigError::Invalid(format!(
                "batch_max_bytes must be at least {}, got {}",
                min_bytes, self.batch_max_bytes
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.batch_max_bytes, 8192);
        assert_eq!(config.batch_delay(), Duration::ZERO);
        assert!(config.bets_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
id = "3"
server_address = "server:12345"
batch_max_amount = 120
batch_delay_ms = 250
bets_file = "/data/agency-3.csv"
"#
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.id, "3");
        assert_eq!(config.server_address, "server:12345");
        assert_eq!(config.batch_max_amount, 120);
        assert_eq!(config.batch_max_bytes, 8192);
        assert_eq!(config.batch_delay(), Duration::from_millis(250));
        assert_eq!(config.bets_file, Some(PathBuf::from("/data/agency-3.csv")));
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"id": "5", "batch_max_bytes": 4096}}"#).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.id, "5");
        assert_eq!(config.batch_max_bytes, 4096);
        assert_eq!(config.batch_max_amount, 50);
    }

    #[test]
    fn test_to_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let config = ClientConfig {
            id: "9".into(),
            batch_delay_ms: 10,
            ..Default::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(ClientConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config
            .apply_vars(vars(&[
                (ENV_ID, "4"),
                (ENV_SERVER_ADDRESS, "agg:9000"),
                (ENV_BATCH_MAX_AMOUNT, " 30 "),
                (ENV_BATCH_MAX_BYTES, "2048"),
                (ENV_BATCH_DELAY_MS, "5"),
                (ENV_BETS_FILE, "/tmp/bets.csv"),
                (ENV_LOG_LEVEL, "DEBUG"),
            ]))
            .unwrap();

        assert_eq!(config.id, "4");
        assert_eq!(config.server_address, "agg:9000");
        assert_eq!(config.batch_max_amount, 30);
        assert_eq!(config.batch_max_bytes, 2048);
        assert_eq!(config.batch_delay_ms, 5);
        assert_eq!(config.bets_file, Some(PathBuf::from("/tmp/bets.csv")));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_env_empty_values_ignored() {
        let mut config = ClientConfig::default();
        config.apply_vars(vars(&[(ENV_ID, ""), (ENV_BATCH_MAX_AMOUNT, "  ")])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_env_bad_number() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_vars(vars(&[(ENV_BATCH_MAX_BYTES, "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: ENV_BATCH_MAX_BYTES, .. }
        ));
    }

    #[test]
    fn test_validation() {
        let bad = [
            ClientConfig { id: String::new(), ..Default::default() },
            ClientConfig { id: "1,2".into(), ..Default::default() },
            ClientConfig { server_address: String::new(), ..Default::default() },
            ClientConfig { batch_max_amount: 0, ..Default::default() },
            ClientConfig { batch_max_amount: 256, ..Default::default() },
            ClientConfig { batch_max_bytes: 5, ..Default::default() },
            ClientConfig { connect_timeout_secs: 0, ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }

        let edge = ClientConfig {
            batch_max_amount: 255,
            batch_max_bytes: 6,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }
}
