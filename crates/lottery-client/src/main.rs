// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lottery agency client CLI
//!
//! Uploads one agency's bets to the aggregator and reports its winners.
//!
//! # Usage
//!
//! ```bash
//! # Upload a bets file
//! lottery-client --id 3 --server 127.0.0.1:12345 --bets agency-3.csv
//!
//! # Smaller batches, paced 100 ms apart
//! lottery-client --id 3 --bets agency-3.csv --max-amount 20 --delay-ms 100
//!
//! # Using configuration file (CLI_* environment variables override it)
//! lottery-client --config client.toml
//!
//! # Single bet from FIRST_NAME / LAST_NAME / DOCUMENT / BIRTHDATE / NUMBER
//! FIRST_NAME=Ana LAST_NAME=Paz DOCUMENT=123 BIRTHDATE=1990-05-01 NUMBER=4540 \
//!     lottery-client --id 1
//! ```

use clap::{Parser, Subcommand};
use lottery_client::{Bet, BetSource, ClientConfig, ClientSession, ConfigError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Lottery agency client
#[derive(Parser, Debug)]
#[command(name = "lottery-client")]
#[command(about = "Lottery agency client - batched bet upload and winners query")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agency id
    #[arg(short, long)]
    id: Option<String>,

    /// Aggregator address (host:port)
    #[arg(short, long)]
    server: Option<String>,

    /// Bets file (first_name,last_name,document,birthdate,number per line)
    #[arg(short, long)]
    bets: Option<PathBuf>,

    /// Maximum bets per batch (1-255)
    #[arg(long)]
    max_amount: Option<usize>,

    /// Maximum batch frame size in bytes
    #[arg(long)]
    max_bytes: Option<usize>,

    /// Pause between acknowledged batches (milliseconds)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "client.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = build_config(&args)?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let bets = load_bets(&config)?;
    let config = Arc::new(config);
    info!(
        agency = %config.id,
        server = %config.server_address,
        bets = bets.len(),
        max_amount = config.batch_max_amount,
        max_bytes = config.batch_max_bytes,
        "lottery client v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut session = ClientSession::new(config.clone(), bets);
    session.connect().await?;

    let outcome = tokio::select! {
        result = session.run() => Some(result.map(|winners| winners.to_vec())),
        _ = shutdown_signal() => None,
    };
    session.stop().await;

    match outcome {
        Some(Ok(winners)) => {
            debug!(agency = %config.id, ?winners, "winning documents");
            info!(
                agency = %config.id,
                winners = winners.len(),
                "all winners received"
            );
            println!("Agency {}: {} winner(s)", config.id, winners.len());
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => {
            info!(agency = %config.id, state = %session.state(), "stopped by signal");
            Ok(())
        }
    }
}

fn build_config(args: &Args) -> Result<ClientConfig, ConfigError> {
    let mut config = match args.config {
        Some(ref path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    config.apply_env()?;

    if let Some(ref id) = args.id {
        config.id = id.clone();
    }
    if let Some(ref server) = args.server {
        config.server_address = server.clone();
    }
    if let Some(ref bets) = args.bets {
        config.bets_file = Some(bets.clone());
    }
    if let Some(max_amount) = args.max_amount {
        config.batch_max_amount = max_amount;
    }
    if let Some(max_bytes) = args.max_bytes {
        config.batch_max_bytes = max_bytes;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.batch_delay_ms = delay_ms;
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn load_bets(config: &ClientConfig) -> lottery_client::Result<Vec<Bet>> {
    match config.bets_file {
        Some(ref path) => BetSource::from_path(path, &config.id),
        None => {
            warn!(agency = %config.id, "no bets file configured, reading a single bet from the environment");
            Ok(vec![Bet::from_env(&config.id)?])
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig {
        id: "1".into(),
        server_address: "server:12345".into(),
        batch_max_amount: 50,
        batch_max_bytes: 8 * 1024,
        batch_delay_ms: 0,
        bets_file: Some(PathBuf::from("/data/agency-1.csv")),
        log_level: "info".into(),
        connect_timeout_secs: 5,
    };

    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# Lottery client configuration
# Generated by lottery-client gen-config
# CLI_ID, CLI_SERVER_ADDRESS, CLI_BATCH_MAX_AMOUNT, CLI_BATCH_MAX_BYTES,
# CLI_BATCH_DELAY_MS, CLI_BETS_FILE and CLI_LOG_LEVEL override these values.

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let result = ClientConfig::from_file(&config_path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match result {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Agency:   {}", config.id);
            println!("Server:   {}", config.server_address);
            println!(
                "Batches:  up to {} bets / {} bytes, {} ms apart",
                config.batch_max_amount, config.batch_max_bytes, config.batch_delay_ms
            );
            match config.bets_file {
                Some(ref path) => println!("Bets:     {}", path.display()),
                None => println!("Bets:     (single bet from environment)"),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}
