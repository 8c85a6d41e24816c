// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative graceful shutdown (spec §4.13). A single
//! [`CancellationToken`] fans cancellation out to every long-running loop;
//! this module additionally sequences the FSM drain and the final task
//! join so that a slow subsystem degrades to a nonzero exit code instead
//! of hanging forever.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::fsm::AgentHandle;

/// Coordinates the shutdown sequence: signal, FSM drain, bus close, task
/// join, all bounded by `deadline`.
pub struct ShutdownOrchestrator {
    signal: CancellationToken,
    agent: AgentHandle,
    deadline: Duration,
    tasks: Vec<JoinHandle<()>>,
    bus_client: Option<async_nats::Client>,
}

impl ShutdownOrchestrator {
    pub fn new(signal: CancellationToken, agent: AgentHandle, deadline: Duration) -> Self {
        Self { signal, agent, deadline, tasks: Vec::new(), bus_client: None }
    }

    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.push(handle);
    }

    pub fn with_bus_client(mut self, client: async_nats::Client) -> Self {
        self.bus_client = Some(client);
        self
    }

    /// Run the full sequence from spec §4.13. Returns `true` on a clean
    /// exit (every task joined before the deadline), `false` otherwise —
    /// the caller maps this to the documented exit codes (0/1).
    pub async fn run(mut self) -> bool {
        // 1. close the signal.
        self.signal.cancel();

        // 2. refuse new scans, wait for the FSM to reach Idle.
        self.agent.request_shutdown();
        let drained = tokio::time::timeout(self.deadline, self.agent.wait_idle()).await.is_ok();
        if !drained {
            warn!("fsm did not reach idle before shutdown deadline");
        }

        // 3/4. scanner supervisors and every other select-loop already
        // unblock on `signal.cancelled()`; there is no separate handle to
        // a live scanner to close out-of-band here.

        // 5. close the message-bus connection.
        if let Some(client) = self.bus_client.take() {
            if let Err(e) = client.drain().await {
                warn!(error = %e, "message bus drain failed");
            }
        }

        // 6. join every tracked task, bounded by the deadline.
        let joins = std::mem::take(&mut self.tasks);
        let all_joined = tokio::time::timeout(self.deadline, async {
            for handle in joins {
                let _ = handle.await;
            }
        })
        .await
        .is_ok();

        if !all_joined {
            warn!("not all worker tasks exited before the shutdown deadline");
        }

        drained && all_joined
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
