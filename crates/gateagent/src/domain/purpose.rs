// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::str::FromStr;

use crate::error::GateAgentError;

/// Whether a gate admits or discharges trucks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePurpose {
    Entry,
    Exit,
}

impl GatePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for GatePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatePurpose {
    type Err = GateAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(Self::Entry),
            "exit" => Ok(Self::Exit),
            other => Err(GateAgentError::ConfigInvalid(format!(
                "undefined gate purpose: {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "purpose_tests.rs"]
mod tests;
