// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::ScanRequest;
use crate::error::GateAgentError;

use super::bus::{AgentState, FsmBus, FsmTransition};
use super::handlers::Handlers;

/// FSM events. `Scanned` carries the request that enters the pipeline;
/// every other event operates on whatever request is currently in flight.
#[derive(Debug)]
pub enum AgentEvent {
    Scanned(ScanRequest),
    Validated,
    Printed,
    Finished,
    Failed(GateAgentError),
    Reset,
}

/// The per-gate request-lifecycle state machine. Owns its event loop; a
/// `Scan` submission enqueues rather than calling in, so handler chains
/// never run recursively from within an entry hook (spec §9).
pub struct Agent {
    state: AgentState,
    current: Option<ScanRequest>,
    handlers: Handlers,
    bus: Arc<FsmBus>,
    tx: mpsc::UnboundedSender<AgentEvent>,
    rx: mpsc::UnboundedReceiver<AgentEvent>,
    state_tx: watch::Sender<AgentState>,
    shutting_down: Arc<AtomicBool>,
}

/// Shared handle for submitting scans and observing/driving shutdown.
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::UnboundedSender<AgentEvent>,
    state_rx: watch::Receiver<AgentState>,
    shutting_down: Arc<AtomicBool>,
}

impl Agent {
    fn new(handlers: Handlers, bus: Arc<FsmBus>) -> (Self, AgentHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AgentState::Idle);
        let shutting_down = Arc::new(AtomicBool::new(false));
        let agent = Self {
            state: AgentState::Idle,
            current: None,
            handlers,
            bus,
            tx: tx.clone(),
            rx,
            state_tx,
            shutting_down: Arc::clone(&shutting_down),
        };
        let handle = AgentHandle { tx, state_rx, shutting_down };
        (agent, handle)
    }

    /// Spawn the event loop on its own task, returning a handle to it.
    pub fn spawn(handlers: Handlers, bus: Arc<FsmBus>, shutdown: CancellationToken) -> AgentHandle {
        let (agent, handle) = Self::new(handlers, bus);
        tokio::spawn(agent.run(shutdown));
        handle
    }

    async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                event = self.rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => return,
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Scanned(request) => {
                self.current = Some(request);
                self.enter(AgentState::Validating).await;
            }
            AgentEvent::Validated => self.enter(AgentState::Printing).await,
            AgentEvent::Printed => self.enter(AgentState::Gating).await,
            AgentEvent::Finished => self.enter(AgentState::Idle).await,
            AgentEvent::Failed(err) => {
                if let Some(request) = self.current.as_mut() {
                    request.fail(err);
                }
                self.enter(AgentState::Error).await;
            }
            AgentEvent::Reset => self.enter(AgentState::Idle).await,
        }
    }

    /// Publish the transition, then run the entry action for `state`. The
    /// next event is enqueued, never dispatched directly, so there is no
    /// recursive descent through `handle_event`.
    async fn enter(&mut self, state: AgentState) {
        self.state = state;
        let _ = self.state_tx.send(state);

        if let Some(request) = self.current.clone() {
            self.bus.publish(FsmTransition { request, state }).await;
        }

        match state {
            AgentState::Idle => {
                self.current = None;
                debug!(shutting_down = self.shutting_down.load(Ordering::SeqCst), "fsm idle");
            }
            AgentState::Validating => {
                let Some(request) = self.current.clone() else { return };
                match self.handlers.run_validate(&request).await {
                    Ok(()) => {
                        let _ = self.tx.send(AgentEvent::Validated);
                    }
                    Err(e) => {
                        let _ = self.tx.send(AgentEvent::Failed(e));
                    }
                }
            }
            AgentState::Printing => {
                let Some(request) = self.current.clone() else { return };
                match self.handlers.run_print(&request).await {
                    Ok(()) => {
                        let _ = self.tx.send(AgentEvent::Printed);
                    }
                    Err(e) => {
                        let _ = self.tx.send(AgentEvent::Failed(e));
                    }
                }
            }
            AgentState::Gating => {
                let Some(request) = self.current.clone() else { return };
                match self.handlers.run_gate(&request).await {
                    Ok(()) => {
                        let _ = self.tx.send(AgentEvent::Finished);
                    }
                    Err(e) => {
                        let _ = self.tx.send(AgentEvent::Failed(e));
                    }
                }
            }
            AgentState::Error => {
                if let Some(request) = self.current.clone() {
                    self.handlers.run_error(&request).await;
                }
                let _ = self.tx.send(AgentEvent::Reset);
            }
        }
    }
}

impl AgentHandle {
    /// Submit a token for processing. Rejects with `Shutdown` if shutdown
    /// has been requested, `Busy` if the FSM is mid-pipeline.
    pub fn scan(&self, request: ScanRequest) -> Result<(), GateAgentError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(GateAgentError::Shutdown);
        }
        if *self.state_rx.borrow() != AgentState::Idle {
            return Err(GateAgentError::Busy);
        }
        self.tx.send(AgentEvent::Scanned(request)).map_err(|_| GateAgentError::Shutdown)?;
        Ok(())
    }

    pub fn state(&self) -> AgentState {
        *self.state_rx.borrow()
    }

    /// Refuse any further `scan` submissions. Does not interrupt a request
    /// already in flight.
    pub fn request_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    /// Wait until the FSM reaches Idle. Completes immediately if already
    /// idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.state_rx.clone();
        if *rx.borrow() == AgentState::Idle {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() == AgentState::Idle {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
