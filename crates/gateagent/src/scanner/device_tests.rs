// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::io::AsyncWriteExt;

use super::*;

fn pair(prefix: &str) -> (Scanner, tokio::io::DuplexStream) {
    let (server, client) = tokio::io::duplex(256);
    (Scanner::new("scanner-1", prefix, Box::new(server)), client)
}

#[tokio::test]
async fn strips_prefix_and_qr_marker() {
    let (mut scanner, mut client) = pair("SCAN");
    client.write_all(b"SCANQR3f1d5f2a-0000-4000-8000-000000000000\n").await.unwrap();

    let token = scanner.accept().await.unwrap();
    assert_eq!(token.as_deref(), Some("3f1d5f2a-0000-4000-8000-000000000000"));
}

#[tokio::test]
async fn trims_whitespace() {
    let (mut scanner, mut client) = pair("");
    client.write_all(b"  abc123  \n").await.unwrap();

    let token = scanner.accept().await.unwrap();
    assert_eq!(token.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn empty_after_trim_yields_no_token() {
    let (mut scanner, mut client) = pair("SCAN");
    client.write_all(b"SCAN\n").await.unwrap();

    let token = scanner.accept().await.unwrap();
    assert_eq!(token, None);
}

#[tokio::test]
async fn closed_stream_is_device_unavailable() {
    let (mut scanner, client) = pair("SCAN");
    drop(client);

    let err = scanner.accept().await.unwrap_err();
    assert!(matches!(err, GateAgentError::DeviceUnavailable(_)));
}
