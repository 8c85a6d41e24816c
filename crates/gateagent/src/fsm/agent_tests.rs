// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::domain::{GatePurpose, ScanRequest, Token};
use crate::fsm::bus::FsmBus;
use crate::fsm::handlers::Handler;

fn sample_request() -> ScanRequest {
    let token = Token::new("3f1d5f2a-0000-4000-8000-000000000000", "scanner-1");
    ScanRequest::new("NLRTM", 12, GatePurpose::Entry, token)
}

fn ok_handler() -> Handler {
    Box::new(|_req| Box::pin(async { Ok(()) }))
}

fn slow_ok_handler(delay: Duration) -> Handler {
    Box::new(move |_req| {
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(())
        })
    })
}

fn failing_handler(err: GateAgentError) -> Handler {
    Box::new(move |_req| {
        let err = err.clone();
        Box::pin(async move { Err(err) })
    })
}

#[tokio::test]
async fn happy_path_walks_full_sequence() {
    let bus = Arc::new(FsmBus::new());
    let (_id, mut rx) = bus.subscribe(8);
    let handlers = Handlers::new().with_validate(ok_handler()).with_print(ok_handler()).with_gate(ok_handler());
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, Arc::clone(&bus), shutdown.clone());

    handle.scan(sample_request()).unwrap();

    let mut states = Vec::new();
    for _ in 0..4 {
        let transition = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        states.push(transition.state);
    }
    assert_eq!(
        states,
        vec![AgentState::Validating, AgentState::Printing, AgentState::Gating, AgentState::Idle]
    );

    shutdown.cancel();
}

#[tokio::test]
async fn validate_failure_routes_through_error_back_to_idle() {
    let bus = Arc::new(FsmBus::new());
    let (_id, mut rx) = bus.subscribe(8);
    let handlers = Handlers::new().with_validate(failing_handler(GateAgentError::NotPermitted));
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, Arc::clone(&bus), shutdown.clone());

    handle.scan(sample_request()).unwrap();

    let mut states = Vec::new();
    for _ in 0..3 {
        let transition = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        states.push(transition.state);
    }
    assert_eq!(states[0], AgentState::Validating);
    assert_eq!(states[1], AgentState::Error);
    assert_eq!(states[2], AgentState::Idle);

    shutdown.cancel();
}

#[tokio::test]
async fn error_transition_carries_the_failure() {
    let bus = Arc::new(FsmBus::new());
    let (_id, mut rx) = bus.subscribe(8);
    let handlers = Handlers::new().with_validate(failing_handler(GateAgentError::NotPermitted));
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, Arc::clone(&bus), shutdown.clone());

    handle.scan(sample_request()).unwrap();

    let _validating = rx.recv().await.unwrap();
    let error_transition = rx.recv().await.unwrap();
    assert_eq!(error_transition.state, AgentState::Error);
    assert!(matches!(error_transition.request.error(), Some(GateAgentError::NotPermitted)));

    shutdown.cancel();
}

#[tokio::test]
async fn rejects_scan_while_mid_pipeline() {
    let bus = Arc::new(FsmBus::new());
    let handlers = Handlers::new().with_validate(slow_ok_handler(Duration::from_millis(200)));
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, bus, shutdown.clone());

    handle.scan(sample_request()).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let err = handle.scan(sample_request()).unwrap_err();
    assert!(matches!(err, GateAgentError::Busy));

    shutdown.cancel();
}

#[tokio::test]
async fn rejects_scan_after_shutdown_requested() {
    let bus = Arc::new(FsmBus::new());
    let handlers = Handlers::new();
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, bus, shutdown.clone());

    handle.request_shutdown();
    let err = handle.scan(sample_request()).unwrap_err();
    assert!(matches!(err, GateAgentError::Shutdown));

    shutdown.cancel();
}

#[tokio::test]
async fn wait_idle_returns_immediately_when_already_idle() {
    let bus = Arc::new(FsmBus::new());
    let handlers = Handlers::new();
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, bus, shutdown.clone());

    tokio::time::timeout(Duration::from_millis(200), handle.wait_idle()).await.unwrap();

    shutdown.cancel();
}

#[tokio::test]
async fn wait_idle_completes_after_full_pipeline_drains() {
    let bus = Arc::new(FsmBus::new());
    let handlers = Handlers::new().with_validate(ok_handler()).with_print(ok_handler()).with_gate(ok_handler());
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, bus, shutdown.clone());

    handle.scan(sample_request()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle.wait_idle()).await.unwrap();
    assert_eq!(handle.state(), AgentState::Idle);

    shutdown.cancel();
}

#[tokio::test]
async fn absent_handlers_default_to_no_op_success() {
    let bus = Arc::new(FsmBus::new());
    let (_id, mut rx) = bus.subscribe(8);
    let handlers = Handlers::new();
    let shutdown = CancellationToken::new();
    let handle = Agent::spawn(handlers, Arc::clone(&bus), shutdown.clone());

    handle.scan(sample_request()).unwrap();

    let mut states = Vec::new();
    for _ in 0..4 {
        let transition = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        states.push(transition.state);
    }
    assert_eq!(
        states,
        vec![AgentState::Validating, AgentState::Printing, AgentState::Gating, AgentState::Idle]
    );

    shutdown.cancel();
}
