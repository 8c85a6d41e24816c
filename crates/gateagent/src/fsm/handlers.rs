// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::domain::ScanRequest;
use crate::error::GateAgentError;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), GateAgentError>> + Send>>;
/// A single capability: given the in-flight request, succeed or fail.
pub type Handler = Box<dyn Fn(&ScanRequest) -> HandlerFuture + Send + Sync>;

/// The four plug-in capabilities the Agent FSM invokes on state entry
/// (spec §9): Validate, Print, Gate, Error. Composition over inheritance —
/// each slot is independent and absence is tolerated as a no-op success.
#[derive(Default)]
pub struct Handlers {
    pub validate: Option<Handler>,
    pub print: Option<Handler>,
    pub gate: Option<Handler>,
    pub error: Option<Handler>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate(mut self, handler: Handler) -> Self {
        self.validate = Some(handler);
        self
    }

    pub fn with_print(mut self, handler: Handler) -> Self {
        self.print = Some(handler);
        self
    }

    pub fn with_gate(mut self, handler: Handler) -> Self {
        self.gate = Some(handler);
        self
    }

    pub fn with_error(mut self, handler: Handler) -> Self {
        self.error = Some(handler);
        self
    }

    pub(super) async fn run_validate(&self, request: &ScanRequest) -> Result<(), GateAgentError> {
        match &self.validate {
            Some(handler) => handler(request).await,
            None => Ok(()),
        }
    }

    pub(super) async fn run_print(&self, request: &ScanRequest) -> Result<(), GateAgentError> {
        match &self.print {
            Some(handler) => handler(request).await,
            None => Ok(()),
        }
    }

    pub(super) async fn run_gate(&self, request: &ScanRequest) -> Result<(), GateAgentError> {
        match &self.gate {
            Some(handler) => handler(request).await,
            None => Ok(()),
        }
    }

    /// Errors from the Error handler itself are logged, never propagated
    /// (spec §4.3: "errors from it are ignored/logged").
    pub(super) async fn run_error(&self, request: &ScanRequest) {
        if let Some(handler) = &self.error {
            if let Err(e) = handler(request).await {
                warn!(scanner = %request.scanner_name(), error = %e, "error handler itself failed");
            }
        }
    }
}
