// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical gate actuation: an opaque shell command representing "open".

use tokio::process::Command;
use tracing::info;

use crate::error::GateAgentError;

/// Opens a gate by spawning a shell to run the configured command.
/// Stateless: repeated `open` calls may each produce a physical actuation,
/// there is no idempotence guarantee (spec §4.5).
#[derive(Clone)]
pub struct GateActuator {
    name: String,
    command: String,
}

impl GateActuator {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self { name: name.into(), command: command.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn open(&self) -> Result<(), GateAgentError> {
        info!(gate = %self.name, command = %self.command, "opening gate");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .await
            .map_err(|e| GateAgentError::ActuatorError(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(GateAgentError::ActuatorError(format!("command exited with {status}")))
        }
    }
}

#[cfg(test)]
#[path = "actuator_tests.rs"]
mod tests;
