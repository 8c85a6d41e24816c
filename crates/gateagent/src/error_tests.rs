// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn code_is_stable_per_variant() {
    assert_eq!(GateAgentError::Busy.code(), "BUSY");
    assert_eq!(GateAgentError::Shutdown.code(), "SHUTDOWN");
    assert_eq!(GateAgentError::TimedOut.code(), "TIMED_OUT");
    assert_eq!(GateAgentError::NotPermitted.code(), "NOT_PERMITTED");
}

#[test]
fn display_includes_detail() {
    let err = GateAgentError::ConfigInvalid("missing [gate]name".into());
    assert!(err.to_string().contains("missing [gate]name"));
}
