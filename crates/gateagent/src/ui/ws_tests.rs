// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use axum_test::TestServer;

use super::*;

#[tokio::test]
async fn broadcast_reaches_a_connected_client() {
    let hub = UiHub::new();
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(Arc::clone(&hub), dir.path());
    let server = TestServer::new(app).unwrap();

    let mut socket = server.get_websocket("/echo").await.into_websocket().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    hub.broadcast(&UiFrame::Online { is_online: true }).await;

    let received: serde_json::Value = socket.receive_json().await;
    assert_eq!(received["IsOnline"], serde_json::json!(true));
}

#[tokio::test]
async fn fsm_frame_carries_state_and_optional_error() {
    let hub = UiHub::new();
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(Arc::clone(&hub), dir.path());
    let server = TestServer::new(app).unwrap();

    let mut socket = server.get_websocket("/echo").await.into_websocket().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    hub.broadcast(&UiFrame::Fsm { fsm_state: "gating".to_owned(), error_message: String::new() }).await;

    let received: serde_json::Value = socket.receive_json().await;
    assert_eq!(received["FsmState"], serde_json::json!("gating"));
}

#[tokio::test]
async fn disconnected_client_is_pruned_without_error() {
    let hub = UiHub::new();
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(Arc::clone(&hub), dir.path());
    let server = TestServer::new(app).unwrap();

    let socket = server.get_websocket("/echo").await.into_websocket().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(socket);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Must not panic even though the only connection is already gone.
    hub.broadcast(&UiFrame::Online { is_online: false }).await;
}
