// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete [`Opener`]s for the two device drivers the spec names: a plain
//! line-emitting path (`keyboard`, e.g. an evdev pipe) and a serial port
//! (`usbcom`) at 115200 8N1.

use tokio_serial::SerialPortBuilderExt;

use crate::error::GateAgentError;

use super::device::Scanner;
use super::supervisor::Opener;

pub fn keyboard_opener(name: impl Into<String>, prefix: impl Into<String>, path: impl Into<String>) -> Opener {
    let name = name.into();
    let prefix = prefix.into();
    let path = path.into();
    Box::new(move || {
        let name = name.clone();
        let prefix = prefix.clone();
        let path = path.clone();
        Box::pin(async move {
            let file = tokio::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .await
                .map_err(|e| GateAgentError::DeviceUnavailable(format!("{path}: {e}")))?;
            Ok(Scanner::new(name, prefix, Box::new(file)))
        })
    })
}

/// 115200 8N1, matching the spec's serial-port contract. `tokio-serial` has
/// no equivalent of the original driver's "minimum read size" knob; the
/// fixed 64-byte read chunk in [`Scanner::accept`] already waits for at
/// least one byte per call, so no counterpart is needed.
pub fn usbcom_opener(
    name: impl Into<String>,
    prefix: impl Into<String>,
    path: impl Into<String>,
    baud_rate: u32,
) -> Opener {
    let name = name.into();
    let prefix = prefix.into();
    let path = path.into();
    Box::new(move || {
        let name = name.clone();
        let prefix = prefix.clone();
        let path = path.clone();
        Box::pin(async move {
            let port = tokio_serial::new(&path, baud_rate)
                .data_bits(tokio_serial::DataBits::Eight)
                .stop_bits(tokio_serial::StopBits::One)
                .parity(tokio_serial::Parity::None)
                .open_native_async()
                .map_err(|e| GateAgentError::DeviceUnavailable(format!("{path}: {e}")))?;
            Ok(Scanner::new(name, prefix, Box::new(port)))
        })
    })
}
