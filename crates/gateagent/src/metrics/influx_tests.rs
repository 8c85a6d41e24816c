// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::domain::{GatePurpose, ScanRequest, Token};
use crate::fsm::AgentState;

fn transition(state: AgentState) -> FsmTransition {
    let token = Token::new("3f1d5f2a-0000-4000-8000-000000000000", "scanner-1");
    let request = ScanRequest::new("NLRTM", 12, GatePurpose::Entry, token);
    FsmTransition { request, state }
}

#[test]
fn line_includes_host_scanner_state_and_timestamp() {
    let sink = InfluxSink::new("http://influx.local/write", "host-1");
    let line = sink.format_line(&transition(AgentState::Gating), 12345);
    assert_eq!(line, "go-gateagent host=\"host-1\",scanner=\"scanner-1\",state=3,error=\"no error\" 12345");
}

#[test]
fn state_values_match_the_spec_encoding() {
    let sink = InfluxSink::new("http://influx.local/write", "host-1");
    assert!(sink.format_line(&transition(AgentState::Idle), 0).contains("state=0"));
    assert!(sink.format_line(&transition(AgentState::Validating), 0).contains("state=1"));
    assert!(sink.format_line(&transition(AgentState::Printing), 0).contains("state=2"));
    assert!(sink.format_line(&transition(AgentState::Error), 0).contains("state=4"));
}

#[test]
fn failed_request_includes_error_text() {
    let sink = InfluxSink::new("http://influx.local/write", "host-1");
    let mut t = transition(AgentState::Error);
    t.request.fail(GateAgentError::NotPermitted);
    let line = sink.format_line(&t, 0);
    assert!(line.contains("error=\"token not permitted\""), "{line}");
}
