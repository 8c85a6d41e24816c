// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sits between the scanner supervisors and the FSM: drops malformed
//! tokens, consults the re-entry guard, and otherwise submits a fresh
//! `ScanRequest` (spec §4.2).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{GatePurpose, ScanRequest, Token};
use crate::fsm::AgentHandle;
use crate::reentry::ReentryGuard;

pub struct Dispatcher {
    location: String,
    loading_place: i64,
    purpose: GatePurpose,
    reentry: Arc<ReentryGuard>,
    agent: AgentHandle,
}

impl Dispatcher {
    pub fn new(
        location: impl Into<String>,
        loading_place: i64,
        purpose: GatePurpose,
        reentry: Arc<ReentryGuard>,
        agent: AgentHandle,
    ) -> Self {
        Self { location: location.into(), loading_place, purpose, reentry, agent }
    }

    pub async fn dispatch(&self, token: Token) {
        if !token.is_well_formed() {
            debug!(scanner = %token.scanner_name, content = %token.content, "ghost scan, discarding");
            return;
        }

        if self.reentry.handle_reentry(&token, &self.location, self.loading_place, self.purpose).await {
            return;
        }

        let request = ScanRequest::new(self.location.clone(), self.loading_place, self.purpose, token);
        if let Err(e) = self.agent.scan(request) {
            warn!(error = %e, "dropping scan, fsm not accepting");
        }
    }

    /// Drain tokens from a fan-in channel fed by one or more scanner
    /// supervisors until shutdown.
    pub async fn run(&self, mut rx: mpsc::Receiver<Token>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                token = rx.recv() => match token {
                    Some(token) => self.dispatch(token).await,
                    None => return,
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
