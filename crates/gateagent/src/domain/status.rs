// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Identifying metadata published alongside gate/scanner health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub instance: i32,
    #[serde(rename = "commitSha")]
    pub commit_sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    #[serde(rename = "locationCode")]
    pub location: String,
    #[serde(rename = "loadingPlaceId")]
    pub loading_place: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateStatus {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerStatus {
    pub name: String,
    pub status: String,
}

/// Full status snapshot published to `gatecontrol.event`/`gatecontrol.agent.status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub hostname: String,
    pub application: Application,
    pub terminal: Terminal,
    pub gates: Vec<GateStatus>,
    pub scanners: Vec<ScannerStatus>,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
