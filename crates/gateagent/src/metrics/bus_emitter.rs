// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::GateAgentError;
use crate::fsm::{FsmBus, FsmTransition};

pub const SUBJECT: &str = "gateagent.fsm.status";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FsmStatusPayload {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Locode")]
    pub locode: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Error")]
    pub error: String,
}

/// Publishes every FSM transition as a JSON status record on the
/// telemetry bus (spec §4.11).
pub struct BusStatusEmitter {
    client: async_nats::Client,
}

impl BusStatusEmitter {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    pub fn payload_for(transition: &FsmTransition) -> FsmStatusPayload {
        FsmStatusPayload {
            state: transition.state.as_str().to_owned(),
            locode: transition.request.location.clone(),
            role: transition.request.purpose.as_str().to_owned(),
            error: transition.request.error().map(|e| e.to_string()).unwrap_or_default(),
        }
    }

    pub async fn publish(&self, transition: &FsmTransition) -> Result<(), GateAgentError> {
        let payload = Self::payload_for(transition);
        let body = serde_json::to_vec(&payload).map_err(|e| GateAgentError::MalformedMessage(e.to_string()))?;
        self.client.publish(SUBJECT, body.into()).await.map_err(|e| GateAgentError::Bus(e.to_string()))?;
        Ok(())
    }

    pub async fn run(&self, bus: Arc<FsmBus>, shutdown: CancellationToken) {
        let (id, mut rx) = bus.subscribe(32);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                transition = rx.recv() => match transition {
                    Some(transition) => {
                        if let Err(e) = self.publish(&transition).await {
                            warn!(error = %e, "fsm status bus publish failed");
                        }
                    }
                    None => break,
                },
            }
        }
        bus.unsubscribe(id);
    }
}

#[cfg(test)]
#[path = "bus_emitter_tests.rs"]
mod tests;
