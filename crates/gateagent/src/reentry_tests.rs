// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::domain::GatePurpose;

fn guard(ttl: Duration) -> (ReentryGuard, mpsc::Receiver<ManualOpenEvent>) {
    let (tx, rx) = mpsc::channel(4);
    let actuator = GateActuator::new("gate-1", "true");
    (ReentryGuard::new(ttl, actuator, tx), rx)
}

fn token(content: &str) -> Token {
    Token::new(content, "scanner-1")
}

fn request_with(token: Token) -> ScanRequest {
    ScanRequest::new("NLRTM", 12, GatePurpose::Entry, token)
}

#[tokio::test]
async fn absent_slot_is_not_a_reentry() {
    let (guard, _rx) = guard(Duration::from_secs(300));
    let handled = guard.handle_reentry(&token("T1"), "NLRTM", 12, GatePurpose::Entry).await;
    assert!(!handled);
}

#[tokio::test]
async fn same_token_within_window_reopens_directly() {
    let (guard, mut rx) = guard(Duration::from_secs(300));
    guard.observe_gating(&request_with(token("T1")));

    let handled = guard.handle_reentry(&token("T1"), "NLRTM", 12, GatePurpose::Entry).await;
    assert!(handled);

    let event = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.request.token.content, "T1");
}

#[tokio::test]
async fn different_token_is_not_a_reentry() {
    let (guard, _rx) = guard(Duration::from_secs(300));
    guard.observe_gating(&request_with(token("T1")));

    let handled = guard.handle_reentry(&token("T2"), "NLRTM", 12, GatePurpose::Entry).await;
    assert!(!handled);
}

#[tokio::test]
async fn window_boundary_is_strict_not_inclusive() {
    let (guard, _rx) = guard(Duration::from_millis(40));
    guard.observe_gating(&request_with(token("T1")));

    tokio::time::sleep(Duration::from_millis(60)).await;

    let handled = guard.handle_reentry(&token("T1"), "NLRTM", 12, GatePurpose::Entry).await;
    assert!(!handled);
}

#[tokio::test]
async fn reentry_still_reports_handled_when_actuator_fails() {
    let (tx, mut rx) = mpsc::channel(4);
    let actuator = GateActuator::new("gate-1", "exit 3");
    let guard = ReentryGuard::new(Duration::from_secs(300), actuator, tx);
    guard.observe_gating(&request_with(token("T1")));

    let handled = guard.handle_reentry(&token("T1"), "NLRTM", 12, GatePurpose::Entry).await;
    assert!(handled);
    assert!(rx.recv().await.is_some());
}
