// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire schemas for the terminal-permission request/reply exchange
//! (spec §4.8, §6). Field casing is fixed by the schema, not by Rust
//! convention, and intentionally differs from the open-gate listener's
//! schema (`loadingplaceId` here vs `loadingPlaceId` there).

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PermissionRequest<'a> {
    pub location: &'a str,
    #[serde(rename = "loadingplaceId")]
    pub loading_place: i64,
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PermissionReply {
    pub permitted: bool,
    #[serde(default)]
    pub message: Option<PermissionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionMessage {
    #[serde(rename = "messageCode")]
    pub message_code: String,
}

/// One of the four logical operations the permission client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ValidateEntry,
    ValidateExit,
    UseEntry,
    UseExit,
}

impl Operation {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::ValidateEntry => "terminalpermission.validate.entry",
            Self::ValidateExit => "terminalpermission.validate.exit",
            Self::UseEntry | Self::UseExit => "terminalpermission.use",
        }
    }

    pub fn type_header(&self) -> &'static str {
        match self {
            Self::ValidateEntry => "net.contargo.terminalpermission.validate.token.entry",
            Self::ValidateExit => "net.contargo.terminalpermission.validate.token.exit",
            Self::UseEntry => "net.contargo.terminalpermission.use.token.entry",
            Self::UseExit => "net.contargo.terminalpermission.use.token.exit",
        }
    }

    pub fn version_header(&self) -> &'static str {
        match self {
            Self::ValidateEntry | Self::ValidateExit => "v2",
            Self::UseEntry | Self::UseExit => "v1",
        }
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
