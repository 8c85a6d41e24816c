// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator UI bridge: a `/echo` WebSocket endpoint and static asset
//! server, broadcasting FSM state and connectivity to every connected
//! browser (spec §4.12).

mod ws;

pub use ws::{build_router, drive, UiFrame, UiHub};
