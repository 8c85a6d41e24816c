// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateagent: a terminal gate-control agent. Reads QR/barcode tokens from
//! one or more attached scanners, validates each against a remote
//! authorization service, drives a physical gate actuator, and reports
//! state and metrics outward.
//!
//! `main.rs` is a thin wiring layer; [`run`] owns the actual startup
//! sequence and runs until shutdown.

pub mod actuator;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod fsm;
pub mod listener;
pub mod metrics;
pub mod permission;
pub mod reentry;
pub mod scanner;
pub mod shutdown;
pub mod status_publisher;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::actuator::GateActuator;
use crate::config::{Config, ScannerConfig};
use crate::domain::{Application, GatePurpose, ScanRequest, Terminal, Token};
use crate::dispatcher::Dispatcher;
use crate::fsm::{Agent, AgentState, FsmBus, Handler, Handlers};
use crate::listener::OpenGateListener;
use crate::metrics::{BusStatusEmitter, InfluxSink};
use crate::permission::PermissionClient;
use crate::reentry::{ManualOpenEvent, ReentryGuard};
use crate::scanner::{keyboard_opener, usbcom_opener, ScannerSupervisor, ScannerStatusEvent};
use crate::shutdown::ShutdownOrchestrator;
use crate::status_publisher::{StatusPublisher, StatusSnapshot};
use crate::ui::UiHub;

const UI_BIND: &str = "localhost:8080";
const STATIC_ASSETS_DIR: &str = "web/dist";
const TOKEN_CHANNEL_BUFFER: usize = 32;
const SCANNER_STATUS_BUFFER: usize = 32;
const MANUAL_OPEN_BUFFER: usize = 8;

fn local_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_owned())
}

fn commit_sha() -> String {
    option_env!("GIT_SHA").unwrap_or("unknown").to_owned()
}

fn build_scanner(cfg: &ScannerConfig) -> Result<ScannerSupervisor, error::GateAgentError> {
    let opener = match cfg.driver.as_str() {
        "keyboard" => keyboard_opener(cfg.name.clone(), cfg.prefix.clone(), cfg.path.clone()),
        "usbcom" => usbcom_opener(cfg.name.clone(), cfg.prefix.clone(), cfg.path.clone(), 115_200),
        other => {
            return Err(error::GateAgentError::ConfigInvalid(format!(
                "unknown scanner driver for {}: {other}",
                cfg.name
            )))
        }
    };
    Ok(ScannerSupervisor::new(cfg.name.clone(), opener))
}

/// Build the four handler capabilities (spec §4.4, §9): Validate, Print,
/// Gate, Error. Each closure captures only what it needs, sharing the
/// permission client and actuator via `Arc`/clone.
fn build_handlers(
    permission: Arc<PermissionClient>,
    actuator: GateActuator,
    print_timeout: Duration,
) -> Handlers {
    let validate_permission = Arc::clone(&permission);
    let validate: Handler = Box::new(move |request: &ScanRequest| {
        let permission = Arc::clone(&validate_permission);
        let location = request.location.clone();
        let loading_place = request.loading_place;
        let token = request.token.content.clone();
        let purpose = request.purpose;
        Box::pin(async move {
            match purpose {
                GatePurpose::Entry => permission.validate_entry(&location, loading_place, &token).await,
                GatePurpose::Exit => permission.validate_exit(&location, loading_place, &token).await,
            }
        })
    });

    let print: Handler = Box::new(move |_request: &ScanRequest| {
        Box::pin(async move {
            tokio::time::sleep(print_timeout).await;
            Ok(())
        })
    });

    let gate_permission = Arc::clone(&permission);
    let gate: Handler = Box::new(move |request: &ScanRequest| {
        let permission = Arc::clone(&gate_permission);
        let actuator = actuator.clone();
        let location = request.location.clone();
        let loading_place = request.loading_place;
        let token = request.token.content.clone();
        let purpose = request.purpose;
        Box::pin(async move {
            let notified = match purpose {
                GatePurpose::Entry => permission.use_entry(&location, loading_place, &token).await,
                GatePurpose::Exit => permission.use_exit(&location, loading_place, &token).await,
            };
            notified.map_err(|e| error::GateAgentError::NotifyError(e.to_string()))?;
            actuator.open().await
        })
    });

    let error: Handler = Box::new(move |request: &ScanRequest| {
        let scanner = request.scanner_name().to_owned();
        let err = request.error().map(|e| e.to_string());
        Box::pin(async move {
            error!(scanner = %scanner, error = ?err, "request entered error state");
            Ok(())
        })
    });

    Handlers::new().with_validate(validate).with_print(print).with_gate(gate).with_error(error)
}

/// Wire every component together and run until shutdown. Returns `Err`
/// only for startup failures (config, bus connect); runtime failures are
/// logged and routed through the FSM's own error state.
pub async fn run(config_path: &std::path::Path) -> Result<(), error::GateAgentError> {
    let config = Config::load(config_path)?;
    run_with_config(config).await
}

async fn run_with_config(config: Config) -> Result<(), error::GateAgentError> {
    let shutdown = CancellationToken::new();

    let bus_client = async_nats::connect(&config.rabbitmq.url)
        .await
        .map_err(|e| error::GateAgentError::Bus(e.to_string()))?;

    let bus = Arc::new(FsmBus::new());

    let permission = Arc::new(PermissionClient::from_client(bus_client.clone()));
    let (manual_open_tx, manual_open_rx) = mpsc::channel::<ManualOpenEvent>(MANUAL_OPEN_BUFFER);

    let reentry_actuator = GateActuator::new(config.gate.name.clone(), config.gate.command.clone());
    let reentry = Arc::new(ReentryGuard::new(config.gate.reentry_timeout, reentry_actuator, manual_open_tx.clone()));

    let handler_actuator = GateActuator::new(config.gate.name.clone(), config.gate.command.clone());
    let handlers = build_handlers(Arc::clone(&permission), handler_actuator, config.application.print_timeout);

    let agent = Agent::spawn(handlers, Arc::clone(&bus), shutdown.clone());

    let dispatcher = Arc::new(Dispatcher::new(
        config.terminal.location.clone(),
        config.terminal.loading_place,
        config.gate.purpose,
        Arc::clone(&reentry),
        agent.clone(),
    ));

    let mut orchestrator = ShutdownOrchestrator::new(shutdown.clone(), agent.clone(), config.application.shutdown_timeout);
    orchestrator = orchestrator.with_bus_client(bus_client.clone());

    // Re-entry guard observes every transition into Gating.
    {
        let (id, mut rx) = bus.subscribe(TOKEN_CHANNEL_BUFFER);
        let reentry = Arc::clone(&reentry);
        let bus_for_unsub = Arc::clone(&bus);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    transition = rx.recv() => match transition {
                        Some(transition) if transition.state == AgentState::Gating => {
                            reentry.observe_gating(&transition.request);
                        }
                        Some(_) => {}
                        None => break,
                    },
                }
            }
            bus_for_unsub.unsubscribe(id);
        });
        orchestrator.track(handle);
    }

    // Scanner supervisors, fanned in to one token channel for the dispatcher.
    let (token_tx, token_rx) = mpsc::channel::<Token>(TOKEN_CHANNEL_BUFFER);
    let (scanner_status_tx, scanner_status_rx) = mpsc::channel::<ScannerStatusEvent>(SCANNER_STATUS_BUFFER);

    for scanner_cfg in &config.scanners {
        let supervisor = Arc::new(build_scanner(scanner_cfg)?);
        supervisor.subscribe_tokens(token_tx.clone());
        supervisor.subscribe_status(scanner_status_tx.clone());

        let shutdown = shutdown.clone();
        let supervisor_run = Arc::clone(&supervisor);
        let handle = tokio::spawn(async move {
            supervisor_run.run(shutdown).await;
        });
        orchestrator.track(handle);
    }
    drop(token_tx);
    drop(scanner_status_tx);

    {
        let dispatcher = Arc::clone(&dispatcher);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            dispatcher.run(token_rx, shutdown).await;
        });
        orchestrator.track(handle);
    }

    let application = Application { name: config.application.name.clone(), instance: config.application.instance, commit_sha: commit_sha() };
    let terminal = Terminal { location: config.terminal.location.clone(), loading_place: config.terminal.loading_place };
    let snapshot = StatusSnapshot::new(local_hostname(), application, terminal);
    let (status_publisher, online_rx) = StatusPublisher::new(snapshot, bus_client.clone());
    status_publisher.update_gate(config.gate.name.clone(), "UP");
    let status_publisher = Arc::new(status_publisher);

    {
        let status_publisher = Arc::clone(&status_publisher);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            status_publisher.run(scanner_status_rx, shutdown).await;
        });
        orchestrator.track(handle);
    }

    // Open-gate command listener, for out-of-band remote "open this gate" commands.
    {
        let listener_actuator = GateActuator::new(config.gate.name.clone(), config.gate.command.clone());
        let listener = OpenGateListener::new(
            config.gate.name.clone(),
            config.terminal.location.clone(),
            config.terminal.loading_place,
            config.gate.purpose,
            listener_actuator,
            manual_open_tx.clone(),
        );
        let client = bus_client.clone();
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = listener.run(client, shutdown).await {
                warn!(error = %e, "open-gate listener exited with error");
            }
        });
        orchestrator.track(handle);
    }

    // Metrics exporters: line-protocol HTTP sink and message-bus FSM status emitter.
    {
        let sink = InfluxSink::new(config.application.influx_url.clone(), local_hostname());
        let bus = Arc::clone(&bus);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            sink.run(bus, shutdown).await;
        });
        orchestrator.track(handle);
    }
    {
        let emitter = BusStatusEmitter::new(bus_client.clone());
        let bus = Arc::clone(&bus);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            emitter.run(bus, shutdown).await;
        });
        orchestrator.track(handle);
    }

    // Operator UI bridge: WebSocket + static asset server.
    let hub = UiHub::new();
    {
        let hub = Arc::clone(&hub);
        let bus = Arc::clone(&bus);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            ui::drive(hub, bus, manual_open_rx, online_rx, shutdown).await;
        });
        orchestrator.track(handle);
    }
    {
        let hub = Arc::clone(&hub);
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            let router = ui::build_router(hub, STATIC_ASSETS_DIR);
            let listener = match tokio::net::TcpListener::bind(UI_BIND).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(error = %e, "failed to bind operator UI listener");
                    return;
                }
            };
            let _ = axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await;
        });
        orchestrator.track(handle);
    }

    info!(gate = %config.gate.name, location = %config.terminal.location, "gateagent started");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
        _ = shutdown.cancelled() => {}
    }

    let clean = orchestrator.run().await;
    if !clean {
        return Err(error::GateAgentError::Shutdown);
    }
    Ok(())
}
