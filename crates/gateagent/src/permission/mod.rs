// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote authorization over the message bus: four logical operations
//! (validateEntry, validateExit, useEntry, useExit), each a request/reply
//! round-trip with a 5 second timeout (spec §4.8).

mod client;
mod messages;

pub use client::PermissionClient;
pub use messages::{Operation, PermissionMessage, PermissionReply, PermissionRequest};
