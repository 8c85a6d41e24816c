// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::domain::ScanRequest;

/// The state an [`FsmTransition`] was published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Validating,
    Printing,
    Gating,
    Error,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Printing => "printing",
            Self::Gating => "gating",
            Self::Error => "error",
        }
    }

    /// Numerical encoding used by the line-protocol metrics sink (spec §4.11).
    pub fn as_metric_value(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Validating => 1,
            Self::Printing => 2,
            Self::Gating => 3,
            Self::Error => 4,
        }
    }
}

/// One FSM state entry, broadcast to every subscriber.
#[derive(Debug, Clone)]
pub struct FsmTransition {
    pub request: ScanRequest,
    pub state: AgentState,
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<FsmTransition>,
}

/// Fan-out of FSM transitions to metrics, telemetry, and UI observers.
///
/// `publish` blocks per subscriber by design (spec §4.7/§9): a slow
/// observer backpressures the FSM rather than silently dropping a
/// transition. Subscribers must provision buffered channels sized for
/// their own consumption rate.
pub struct FsmBus {
    next_id: AtomicU64,
    subs: Mutex<Vec<Subscriber>>,
}

/// Handle returned by [`FsmBus::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

impl FsmBus {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(0), subs: Mutex::new(Vec::new()) }
    }

    pub fn subscribe(&self, buffer: usize) -> (SubscriptionId, mpsc::Receiver<FsmTransition>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(buffer);
        self.subs.lock().unwrap_or_else(|e| e.into_inner()).push(Subscriber { id, tx });
        (SubscriptionId(id), rx)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subs.lock().unwrap_or_else(|e| e.into_inner()).retain(|s| s.id != id.0);
    }

    /// Publish a transition, blocking per subscriber until each has room.
    pub async fn publish(&self, transition: FsmTransition) {
        let senders: Vec<mpsc::Sender<FsmTransition>> = {
            let subs = self.subs.lock().unwrap_or_else(|e| e.into_inner());
            subs.iter().map(|s| s.tx.clone()).collect()
        };
        for tx in senders {
            let _ = tx.send(transition.clone()).await;
        }
    }
}

impl Default for FsmBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
