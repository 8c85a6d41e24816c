// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Re-entry deduplication: a second presentation of the same token within
//! a configured window reopens the gate directly instead of re-running the
//! full validate/print/gate pipeline (spec §4.6).

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::actuator::GateActuator;
use crate::domain::{GatePurpose, ScanRequest, Token};

/// Broadcast when the guard reopens a gate outside the FSM, so the UI can
/// render a gating frame without a matching FSM transition having run.
#[derive(Debug, Clone)]
pub struct ManualOpenEvent {
    pub request: ScanRequest,
}

struct LastTokenScan {
    request: ScanRequest,
    seen_at: Instant,
}

/// Holds at most one [`LastTokenScan`] under a mutex, and a leaf reference
/// to the gate actuator it may invoke directly (spec §9's "cyclic
/// ownership" note: the guard owns the actuator and a uni-directional
/// signal to the UI, never the reverse).
pub struct ReentryGuard {
    slot: Mutex<Option<LastTokenScan>>,
    ttl: Duration,
    actuator: GateActuator,
    manual_open_tx: mpsc::Sender<ManualOpenEvent>,
}

impl ReentryGuard {
    pub fn new(ttl: Duration, actuator: GateActuator, manual_open_tx: mpsc::Sender<ManualOpenEvent>) -> Self {
        Self { slot: Mutex::new(None), ttl, actuator, manual_open_tx }
    }

    /// Called by whatever observes FSM transitions into Gating.
    pub fn observe_gating(&self, request: &ScanRequest) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(LastTokenScan { request: request.clone(), seen_at: Instant::now() });
    }

    /// Returns `true` if this token was handled as a re-entry (the caller
    /// must not build a fresh `ScanRequest` or submit to the FSM). The
    /// window is strict: an age exactly equal to the TTL is outside it.
    pub async fn handle_reentry(
        &self,
        token: &Token,
        location: &str,
        loading_place: i64,
        purpose: GatePurpose,
    ) -> bool {
        let matched = {
            let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(last) if last.seen_at.elapsed() < self.ttl && last.request.token.content == token.content => {
                    Some(last.request.clone())
                }
                _ => None,
            }
        };

        let Some(last_request) = matched else { return false };

        info!(
            scanner = %token.scanner_name,
            gate = %self.actuator.name(),
            "re-entry within window, reopening gate directly"
        );

        if let Err(e) = self.actuator.open().await {
            warn!(gate = %self.actuator.name(), error = %e, "re-entry gate open failed");
        }

        let synthetic = ScanRequest::new(location, loading_place, purpose, last_request.token.clone());
        let _ = self.manual_open_tx.send(ManualOpenEvent { request: synthetic }).await;

        true
    }
}

#[cfg(test)]
#[path = "reentry_tests.rs"]
mod tests;
