// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::GateAgentError;
use crate::fsm::{FsmBus, FsmTransition};

/// Formats each FSM transition as an InfluxDB line-protocol record and
/// POSTs it to a configured URL.
pub struct InfluxSink {
    client: reqwest::Client,
    url: String,
    hostname: String,
}

impl InfluxSink {
    pub fn new(url: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into(), hostname: hostname.into() }
    }

    /// Pure formatting, separated from the HTTP call so it is directly
    /// testable.
    pub fn format_line(&self, transition: &FsmTransition, unix_nanos: u128) -> String {
        let scanner = transition.request.scanner_name();
        let error = transition.request.error().map(|e| e.to_string()).unwrap_or_else(|| "no error".to_owned());
        format!(
            "go-gateagent host={:?},scanner={:?},state={},error={:?} {}",
            self.hostname,
            scanner,
            transition.state.as_metric_value(),
            error,
            unix_nanos
        )
    }

    pub async fn publish(&self, transition: &FsmTransition) -> Result<(), GateAgentError> {
        let unix_nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        let line = self.format_line(transition, unix_nanos);
        self.client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(line)
            .send()
            .await
            .map_err(|e| GateAgentError::Bus(e.to_string()))?;
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
                            warn!(error = %e, "influx publish failed");
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
#[path = "influx_tests.rs"]
mod tests;
