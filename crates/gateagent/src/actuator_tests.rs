// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn zero_exit_is_success() {
    let actuator = GateActuator::new("gate-1", "true");
    actuator.open().await.unwrap();
}

#[tokio::test]
async fn nonzero_exit_is_actuator_error() {
    let actuator = GateActuator::new("gate-1", "exit 7");
    let err = actuator.open().await.unwrap_err();
    assert!(matches!(err, GateAgentError::ActuatorError(_)));
}

#[tokio::test]
async fn repeated_open_is_not_deduplicated() {
    let actuator = GateActuator::new("gate-1", "true");
    actuator.open().await.unwrap();
    actuator.open().await.unwrap();
}
