// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end runs against a local TCP aggregator.

mod common;

use common::{config, make_bets, serve_agency};
use lottery_client::{BetSource, ClientConfig, ClientError, ClientSession, SessionState};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

#[tokio::test]
async fn test_upload_over_tcp() {
    let (listener, addr) = listen().await;
    let aggregator = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        serve_agency(stream, 1).await.unwrap()
    });

    let cfg = Arc::new(ClientConfig {
        server_address: addr,
        ..(*config("4", 5, 8192)).clone()
    });
    let mut session = ClientSession::new(cfg, make_bets("4", 12, 5));
    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Connected);

    let winners = session.run().await.unwrap().to_vec();
    let transcript = aggregator.await.unwrap();

    assert_eq!(transcript.batches.len(), 3);
    assert_eq!(transcript.agency, "4");
    assert!(transcript
        .batches
        .iter()
        .flat_map(|b| b.bets.iter())
        .all(|bet| bet.agency() == "4"));
    assert_eq!(winners, vec!["30000000", "30000005", "30000010"]);
    assert_eq!(session.state(), SessionState::Closed);

    // Stopping a closed session changes nothing.
    session.stop().await;
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.stats().connections_closed, 1);
}

#[tokio::test]
async fn test_bets_file_upload() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Ana,Paz,30904465,1999-03-17,4540").unwrap();
    writeln!(file, "Luis,Vera,29384732,1985-11-02,7721").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "Eva,Sosa,33791005,2001-07-29,4540").unwrap();

    let bets = BetSource::from_path(file.path(), "2").unwrap();
    assert_eq!(bets.len(), 3);

    let (listener, addr) = listen().await;
    let aggregator = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        serve_agency(stream, 1).await.unwrap()
    });

    let cfg = Arc::new(ClientConfig {
        id: "2".into(),
        server_address: addr,
        ..Default::default()
    });
    let mut session = ClientSession::new(cfg, bets);
    session.connect().await.unwrap();
    let winners = session.run().await.unwrap().to_vec();
    let transcript = aggregator.await.unwrap();

    assert_eq!(transcript.batches.len(), 1);
    assert!(transcript.batches[0].last);
    assert_eq!(transcript.batches[0].bets[1].first_name(), "Luis");
    assert_eq!(winners, vec!["30904465", "33791005"]);
}

#[tokio::test]
async fn test_batches_are_paced() {
    let (listener, addr) = listen().await;
    let aggregator = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        serve_agency(stream, 1).await.unwrap()
    });

    let cfg = Arc::new(ClientConfig {
        id: "5".into(),
        server_address: addr,
        batch_max_amount: 2,
        batch_delay_ms: 40,
        ..Default::default()
    });
    let mut session = ClientSession::new(cfg, make_bets("5", 6, 0));
    session.connect().await.unwrap();

    let started = Instant::now();
    session.run().await.unwrap();
    let elapsed = started.elapsed();
    let transcript = aggregator.await.unwrap();

    // Three batches, two pauses between them, none after the last.
    assert_eq!(transcript.batches.len(), 3);
    assert!(elapsed >= Duration::from_millis(80), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_connect_refused_fails_session() {
    // Bind then drop to get a port nobody listens on.
    let (listener, addr) = listen().await;
    drop(listener);

    let cfg = Arc::new(ClientConfig {
        server_address: addr.clone(),
        ..Default::default()
    });
    let mut session = ClientSession::new(cfg, make_bets("1", 1, 0));

    let err = session.connect().await.unwrap_err();
    match err {
        ClientError::Connect { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.state(), SessionState::Failed);
    assert!(matches!(session.run().await, Err(ClientError::SessionClosed)));
}
