// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::Token;
use crate::error::GateAgentError;

use super::device::Scanner;

const DOWN_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Health of a supervised scanner. `Unknown` never leaves the supervisor —
/// only `Up`/`Down` edges are published (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Unknown,
    Up,
    Down,
}

impl ScannerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

/// A published scanner health edge.
#[derive(Debug, Clone)]
pub struct ScannerStatusEvent {
    pub name: String,
    pub state: ScannerState,
    pub error: Option<String>,
}

pub type OpenerFuture = Pin<Box<dyn Future<Output = Result<Scanner, GateAgentError>> + Send>>;
/// Produces a fresh scanner, or an error if the device could not be opened.
pub type Opener = Box<dyn Fn() -> OpenerFuture + Send + Sync>;

/// Wraps an [`Opener`] with reopen-on-failure and UP/DOWN edge publication.
pub struct ScannerSupervisor {
    name: String,
    opener: Opener,
    state: Mutex<ScannerState>,
    token_subs: Mutex<Vec<mpsc::Sender<Token>>>,
    status_subs: Mutex<Vec<mpsc::Sender<ScannerStatusEvent>>>,
}

impl ScannerSupervisor {
    pub fn new(name: impl Into<String>, opener: Opener) -> Self {
        Self {
            name: name.into(),
            opener,
            state: Mutex::new(ScannerState::Unknown),
            token_subs: Mutex::new(Vec::new()),
            status_subs: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe_tokens(&self, tx: mpsc::Sender<Token>) {
        self.token_subs.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
    }

    pub fn subscribe_status(&self, tx: mpsc::Sender<ScannerStatusEvent>) {
        self.status_subs.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
    }

    pub fn state(&self) -> ScannerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the reopen loop until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            if shutdown.is_cancelled() {
                return;
            }

            if self.state() == ScannerState::Down {
                tokio::select! {
                    _ = tokio::time::sleep(DOWN_RETRY_INTERVAL) => {}
                    _ = shutdown.cancelled() => return,
                }
            }

            let opened = (self.opener)().await;
            let mut scanner = match opened {
                Ok(scanner) => {
                    self.transition(ScannerState::Up, None);
                    scanner
                }
                Err(e) => {
                    self.transition(ScannerState::Down, Some(e.to_string()));
                    continue;
                }
            };

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    accepted = scanner.accept() => {
                        match accepted {
                            Ok(Some(raw)) => self.dispatch_token(&raw, scanner.name()),
                            Ok(None) => {}
                            Err(e) => {
                                self.transition(ScannerState::Down, Some(e.to_string()));
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    fn transition(&self, next: ScannerState, error: Option<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let is_edge = match next {
            ScannerState::Up => *state != ScannerState::Up,
            ScannerState::Down => *state != ScannerState::Down,
            ScannerState::Unknown => false,
        };
        if !is_edge {
            return;
        }
        *state = next;
        drop(state);

        match next {
            ScannerState::Up => info!(scanner = %self.name, "scanner up"),
            ScannerState::Down => warn!(scanner = %self.name, error = ?error, "scanner down"),
            ScannerState::Unknown => {}
        }

        self.publish_status(ScannerStatusEvent { name: self.name.clone(), state: next, error });
    }

    fn publish_status(&self, event: ScannerStatusEvent) {
        let subs = self.status_subs.lock().unwrap_or_else(|e| e.into_inner());
        for tx in subs.iter() {
            let _ = tx.try_send(event.clone());
        }
    }

    fn dispatch_token(&self, raw: &str, scanner_name: &str) {
        let token = Token::new(raw, scanner_name);
        debug!(scanner = %scanner_name, content = %token.content, "received token");
        let subs = self.token_subs.lock().unwrap_or_else(|e| e.into_inner());
        for tx in subs.iter() {
            let _ = tx.try_send(token.clone());
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
