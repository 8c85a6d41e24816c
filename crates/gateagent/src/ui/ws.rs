// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use crate::fsm::FsmBus;
use crate::reentry::ManualOpenEvent;

/// Frame pushed to connected browsers. The wire shape is one of two flat
/// JSON objects, matched by field presence on the receiving end (spec
/// §4.12, §6).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UiFrame {
    Fsm {
        #[serde(rename = "FsmState")]
        fsm_state: String,
        #[serde(rename = "ErrorMessage")]
        error_message: String,
    },
    Online {
        #[serde(rename = "IsOnline")]
        is_online: bool,
    },
}

/// Live WebSocket connections under a single lock, held across each
/// write so that removing a dead connection is atomic with the
/// broadcast that discovered it (spec §9: consistent mutex discipline,
/// fixing the original's inconsistent use in `echo`).
pub struct UiHub {
    connections: Mutex<Vec<SplitSink<WebSocket, Message>>>,
}

impl UiHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { connections: Mutex::new(Vec::new()) })
    }

    async fn add(&self, sink: SplitSink<WebSocket, Message>) {
        self.connections.lock().await.push(sink);
    }

    pub async fn broadcast(&self, frame: &UiFrame) {
        let Ok(json) = serde_json::to_string(frame) else { return };
        let mut connections = self.connections.lock().await;
        let mut dead = Vec::new();
        for (i, sink) in connections.iter_mut().enumerate() {
            if sink.send(Message::Text(json.clone().into())).await.is_err() {
                dead.push(i);
            }
        }
        for i in dead.into_iter().rev() {
            connections.remove(i);
        }
    }
}

async fn echo_handler(State(hub): State<Arc<UiHub>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sink, mut stream) = socket.split();
        hub.add(sink).await;
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    })
}

pub fn build_router(hub: Arc<UiHub>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/echo", get(echo_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(hub)
}

/// Bridge the FSM bus, the manual-open signal, and the is-online watch
/// into hub broadcasts until shutdown.
pub async fn drive(
    hub: Arc<UiHub>,
    bus: Arc<FsmBus>,
    mut manual_open_rx: tokio::sync::mpsc::Receiver<ManualOpenEvent>,
    mut online_rx: watch::Receiver<bool>,
    shutdown: CancellationToken,
) {
    let (id, mut bus_rx) = bus.subscribe(32);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            transition = bus_rx.recv() => match transition {
                Some(transition) => {
                    let frame = UiFrame::Fsm {
                        fsm_state: transition.state.as_str().to_owned(),
                        error_message: transition.request.error().map(|e| e.to_string()).unwrap_or_default(),
                    };
                    hub.broadcast(&frame).await;
                }
                None => break,
            },
            manual = manual_open_rx.recv() => match manual {
                Some(event) => {
                    let _ = event;
                    hub.broadcast(&UiFrame::Fsm {
                        fsm_state: crate::fsm::AgentState::Gating.as_str().to_owned(),
                        error_message: String::new(),
                    }).await;
                }
                None => break,
            },
            changed = online_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let is_online = *online_rx.borrow();
                hub.broadcast(&UiFrame::Online { is_online }).await;
            }
        }
    }

    bus.unsubscribe(id);
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
