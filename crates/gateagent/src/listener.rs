// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open-gate command listener: subscribes to `gates.open` on the
//! `gatecontrol.event` subject space and invokes the actuator directly
//! when this gate's name is named for the matching terminal (spec §4.9).

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::actuator::GateActuator;
use crate::domain::GatePurpose;
use crate::error::GateAgentError;
use crate::reentry::ManualOpenEvent;

pub const SUBJECT: &str = "gatecontrol.event.gates.open";

#[derive(Debug, Deserialize)]
struct OpenGateCommand {
    terminal: TerminalRef,
    gates: Vec<GateRef>,
}

#[derive(Debug, Deserialize)]
struct TerminalRef {
    #[serde(rename = "locationCode")]
    location_code: String,
    #[serde(rename = "loadingPlaceId")]
    loading_place_id: i64,
}

#[derive(Debug, Deserialize)]
struct GateRef {
    name: String,
}

pub struct OpenGateListener {
    gate_name: String,
    location: String,
    loading_place: i64,
    purpose: GatePurpose,
    actuator: GateActuator,
    manual_open_tx: mpsc::Sender<ManualOpenEvent>,
}

impl OpenGateListener {
    pub fn new(
        gate_name: impl Into<String>,
        location: impl Into<String>,
        loading_place: i64,
        purpose: GatePurpose,
        actuator: GateActuator,
        manual_open_tx: mpsc::Sender<ManualOpenEvent>,
    ) -> Self {
        Self {
            gate_name: gate_name.into(),
            location: location.into(),
            loading_place,
            purpose,
            actuator,
            manual_open_tx,
        }
    }

    /// Decide whether the parsed command names this gate, and if so
    /// synthesize the manual-open notification. Pure decode+match logic,
    /// separated from the bus loop so it is testable without a broker.
    fn matches(&self, command: &OpenGateCommand) -> bool {
        command.terminal.location_code == self.location
            && command.terminal.loading_place_id == self.loading_place
            && command.gates.iter().any(|g| g.name == self.gate_name)
    }

    async fn handle_payload(&self, payload: &[u8]) -> Result<(), GateAgentError> {
        let command: OpenGateCommand =
            serde_json::from_slice(payload).map_err(|e| GateAgentError::MalformedMessage(e.to_string()))?;

        if !self.matches(&command) {
            debug!(gate = %self.gate_name, "open-gate command not for this gate, ignoring");
            return Ok(());
        }

        if let Err(e) = self.actuator.open().await {
            warn!(gate = %self.gate_name, error = %e, "manual open command failed");
        }

        use crate::domain::{ScanRequest, Token};
        let request = ScanRequest::new(
            self.location.clone(),
            self.loading_place,
            self.purpose,
            Token::new("", self.gate_name.clone()),
        );
        let _ = self.manual_open_tx.send(ManualOpenEvent { request }).await;

        Ok(())
    }

    /// Subscribe and process commands until shutdown. Unparsable messages
    /// are logged and dropped (the NATS core API has no nack-with-requeue
    /// primitive; this mirrors the "nacked without requeue" contract).
    pub async fn run(&self, client: async_nats::Client, shutdown: CancellationToken) -> Result<(), GateAgentError> {
        let mut sub =
            client.subscribe(SUBJECT).await.map_err(|e| GateAgentError::Bus(e.to_string()))?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                msg = sub.next() => {
                    let Some(msg) = msg else { return Ok(()) };
                    if let Err(e) = self.handle_payload(&msg.payload).await {
                        warn!(error = %e, "open-gate command dropped");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
