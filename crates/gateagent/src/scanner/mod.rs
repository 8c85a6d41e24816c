// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner devices and the self-healing supervisor that keeps them open.

mod device;
mod drivers;
mod supervisor;

pub use device::Scanner;
pub use drivers::{keyboard_opener, usbcom_opener};
pub use supervisor::{ScannerSupervisor, ScannerState, ScannerStatusEvent};
