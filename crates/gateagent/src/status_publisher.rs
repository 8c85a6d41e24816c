// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic aggregated gate+scanner health publisher (spec §4.10).
//! Publishes on a 60s interval, once 5s after startup, and on every
//! scanner-status transition. Publish outcome drives an "is-online"
//! signal consumed by the operator UI bridge.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::domain::{Application, GateStatus, ScannerStatus, Status, Terminal};
use crate::scanner::ScannerStatusEvent;

pub const SUBJECT: &str = "gatecontrol.event.gatecontrol.agent.status";

const PERIODIC_INTERVAL: Duration = Duration::from_secs(60);
const INITIAL_DELAY: Duration = Duration::from_secs(5);

/// The two name→status maps and identifying metadata, with no network
/// dependency — separated from [`StatusPublisher`] so the snapshot logic
/// is testable without a running message bus.
pub struct StatusSnapshot {
    hostname: String,
    application: Application,
    terminal: Terminal,
    gates: Mutex<HashMap<String, String>>,
    scanners: Mutex<HashMap<String, String>>,
}

impl StatusSnapshot {
    pub fn new(hostname: impl Into<String>, application: Application, terminal: Terminal) -> Self {
        Self {
            hostname: hostname.into(),
            application,
            terminal,
            gates: Mutex::new(HashMap::new()),
            scanners: Mutex::new(HashMap::new()),
        }
    }

    pub fn update_gate(&self, name: impl Into<String>, status: impl Into<String>) {
        self.gates.lock().unwrap_or_else(|e| e.into_inner()).insert(name.into(), status.into());
    }

    pub fn update_scanner(&self, name: impl Into<String>, status: impl Into<String>) {
        self.scanners.lock().unwrap_or_else(|e| e.into_inner()).insert(name.into(), status.into());
    }

    pub fn build(&self) -> Status {
        let gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        let scanners = self.scanners.lock().unwrap_or_else(|e| e.into_inner());
        Status {
            hostname: self.hostname.clone(),
            application: self.application.clone(),
            terminal: self.terminal.clone(),
            gates: gates.iter().map(|(name, status)| GateStatus { name: name.clone(), status: status.clone() }).collect(),
            scanners: scanners
                .iter()
                .map(|(name, status)| ScannerStatus { name: name.clone(), status: status.clone() })
                .collect(),
        }
    }
}

pub struct StatusPublisher {
    snapshot: StatusSnapshot,
    client: async_nats::Client,
    online_tx: watch::Sender<bool>,
}

impl StatusPublisher {
    pub fn new(snapshot: StatusSnapshot, client: async_nats::Client) -> (Self, watch::Receiver<bool>) {
        let (online_tx, online_rx) = watch::channel(false);
        (Self { snapshot, client, online_tx }, online_rx)
    }

    pub fn update_gate(&self, name: impl Into<String>, status: impl Into<String>) {
        self.snapshot.update_gate(name, status);
    }

    pub async fn publish_now(&self) {
        let status = self.snapshot.build();
        let ok = match serde_json::to_vec(&status) {
            Ok(payload) => self.client.publish(SUBJECT, payload.into()).await.is_ok(),
            Err(_) => false,
        };
        if !ok {
            warn!("status snapshot publish failed");
        }
        let _ = self.online_tx.send(ok);
    }

    /// Record a scanner-status transition and publish immediately.
    pub async fn note_scanner_status(&self, event: ScannerStatusEvent) {
        self.snapshot.update_scanner(event.name, event.state.as_str());
        self.publish_now().await;
    }

    pub async fn run(
        &self,
        mut scanner_status_rx: tokio::sync::mpsc::Receiver<ScannerStatusEvent>,
        shutdown: CancellationToken,
    ) {
        tokio::select! {
            _ = tokio::time::sleep(INITIAL_DELAY) => self.publish_now().await,
            _ = shutdown.cancelled() => return,
        }

        let mut ticker = tokio::time::interval(PERIODIC_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.reset();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => self.publish_now().await,
                event = scanner_status_rx.recv() => match event {
                    Some(event) => self.note_scanner_status(event).await,
                    None => return,
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "status_publisher_tests.rs"]
mod tests;
