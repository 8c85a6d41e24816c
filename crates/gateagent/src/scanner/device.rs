// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::GateAgentError;

const READ_CHUNK: usize = 64;
const QR_PREFIX: &str = "QR";

/// A scanner is a line-delimited byte stream with a configured per-device
/// prefix. `accept` yields the next non-empty token, or an error on any
/// device failure (including EOF).
pub struct Scanner {
    name: String,
    prefix: String,
    reader: Box<dyn AsyncRead + Unpin + Send>,
}

impl Scanner {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, reader: Box<dyn AsyncRead + Unpin + Send>) -> Self {
        Self { name: name.into(), prefix: prefix.into(), reader }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Read the next raw token, or `None` if this read produced an empty
    /// token after trimming and prefix-stripping (no token emitted, but the
    /// scanner stays open).
    pub async fn accept(&mut self) -> Result<Option<String>, GateAgentError> {
        let mut buf = [0u8; READ_CHUNK];
        let n = self
            .reader
            .read(&mut buf)
            .await
            .map_err(|e| GateAgentError::DeviceUnavailable(format!("{}: {e}", self.name)))?;
        if n == 0 {
            return Err(GateAgentError::DeviceUnavailable(format!("{}: end of stream", self.name)));
        }

        let raw = String::from_utf8_lossy(&buf[..n]);
        let trimmed = raw.trim();
        let without_prefix = trimmed.strip_prefix(self.prefix.as_str()).unwrap_or(trimmed);
        let without_qr = without_prefix.strip_prefix(QR_PREFIX).unwrap_or(without_prefix);

        if without_qr.is_empty() {
            Ok(None)
        } else {
            Ok(Some(without_qr.to_owned()))
        }
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
