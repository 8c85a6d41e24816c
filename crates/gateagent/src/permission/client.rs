// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/reply bridge to the remote terminal-permission service
//! (spec §4.8). NATS request/reply gives every request its own private
//! inbox subject, so the correlation-id/`amq.rabbitmq.reply-to` dance the
//! original AMQP wire format needs is handled by the client library; a
//! `correlation-id` header carrying the token is still attached for
//! parity with the documented wire schema and for tracing on the
//! receiving side.

use std::time::Duration;

use async_nats::HeaderMap;
use tracing::warn;

use crate::error::GateAgentError;

use super::messages::{Operation, PermissionReply, PermissionRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PermissionClient {
    client: async_nats::Client,
}

impl PermissionClient {
    pub async fn connect(url: &str) -> Result<Self, GateAgentError> {
        let client = async_nats::connect(url).await.map_err(|e| GateAgentError::Bus(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }

    pub async fn validate_entry(&self, location: &str, loading_place: i64, token: &str) -> Result<(), GateAgentError> {
        self.request(Operation::ValidateEntry, location, loading_place, token).await
    }

    pub async fn validate_exit(&self, location: &str, loading_place: i64, token: &str) -> Result<(), GateAgentError> {
        self.request(Operation::ValidateExit, location, loading_place, token).await
    }

    pub async fn use_entry(&self, location: &str, loading_place: i64, token: &str) -> Result<(), GateAgentError> {
        self.request(Operation::UseEntry, location, loading_place, token).await
    }

    pub async fn use_exit(&self, location: &str, loading_place: i64, token: &str) -> Result<(), GateAgentError> {
        self.request(Operation::UseExit, location, loading_place, token).await
    }

    async fn request(
        &self,
        op: Operation,
        location: &str,
        loading_place: i64,
        token: &str,
    ) -> Result<(), GateAgentError> {
        let body = PermissionRequest { location, loading_place, token };
        let payload = serde_json::to_vec(&body).map_err(|e| GateAgentError::MalformedMessage(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("type", op.type_header());
        headers.insert("version", op.version_header());
        headers.insert("correlation-id", token);

        let reply = tokio::time::timeout(
            REQUEST_TIMEOUT,
            self.client.request_with_headers(op.subject(), headers, payload.into()),
        )
        .await
        .map_err(|_| GateAgentError::TimedOut)?
        .map_err(|e| GateAgentError::Bus(e.to_string()))?;

        let reply: PermissionReply =
            serde_json::from_slice(&reply.payload).map_err(|e| GateAgentError::MalformedMessage(e.to_string()))?;

        interpret_reply(reply, token)
    }
}

/// Pure branch on a decoded reply: permitted, or carrying an error.
/// Separated from [`PermissionClient::request`] so the decision logic is
/// testable without a running NATS server.
fn interpret_reply(reply: PermissionReply, token: &str) -> Result<(), GateAgentError> {
    if let Some(message) = reply.message {
        warn!(token, code = %message.message_code, "permission denied");
        return Err(GateAgentError::PermissionError(message.message_code));
    }

    if reply.permitted {
        Ok(())
    } else {
        Err(GateAgentError::NotPermitted)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
