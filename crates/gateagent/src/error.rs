// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Unified error type for the gate-control agent, covering config load,
/// device I/O, message-bus, and handler failures (spec §7).
#[derive(Debug, Clone, Error)]
pub enum GateAgentError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("scanner device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("token not permitted")]
    NotPermitted,

    #[error("permission error: {0}")]
    PermissionError(String),

    #[error("failed to notify gate-control of use: {0}")]
    NotifyError(String),

    #[error("gate actuator failed: {0}")]
    ActuatorError(String),

    #[error("timed out waiting for reply")]
    TimedOut,

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("worker is busy")]
    Busy,

    #[error("worker is shutting down")]
    Shutdown,

    #[error("message bus error: {0}")]
    Bus(String),

    #[error("unknown purpose: {0}")]
    UnknownPurpose(String),
}

impl GateAgentError {
    /// Machine-readable code, matching the spec §7 error kind names.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigInvalid(_) => "CONFIG_INVALID",
            Self::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            Self::NotPermitted => "NOT_PERMITTED",
            Self::PermissionError(_) => "PERMISSION_ERROR",
            Self::NotifyError(_) => "NOTIFY_ERROR",
            Self::ActuatorError(_) => "ACTUATOR_ERROR",
            Self::TimedOut => "TIMED_OUT",
            Self::MalformedMessage(_) => "MALFORMED_MESSAGE",
            Self::Busy => "BUSY",
            Self::Shutdown => "SHUTDOWN",
            Self::Bus(_) => "BUS_ERROR",
            Self::UnknownPurpose(_) => "UNKNOWN_PURPOSE",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
