// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! NTSTATUS-style completion codes handed back to the endpoint adapter.

use serde::Serialize;
use std::fmt;

/// Completion status attached to every terminal request.
///
/// Values mirror the NTSTATUS codes a kernel-mode endpoint would complete the
/// underlying control request with, so an adapter can pass them through
/// without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Status(pub u32);

impl Status {
    pub const SUCCESS: Status = Status(0x0000_0000);
    pub const INVALID_DEVICE_REQUEST: Status = Status(0xC000_0010);
    pub const BUFFER_TOO_SMALL: Status = Status(0xC000_0023);
    pub const DEVICE_NOT_READY: Status = Status(0xC000_00A3);
    pub const INTERNAL_ERROR: Status = Status(0xC000_00E5);
    pub const CANCELLED: Status = Status(0xC000_0120);

    /// Severity bits `11` mark an error status.
    pub fn is_error(self) -> bool {
        self.0 >> 30 == 0b11
    }

    pub fn is_success(self) -> bool {
        self == Status::SUCCESS
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Status::SUCCESS => Some("STATUS_SUCCESS"),
            Status::INVALID_DEVICE_REQUEST => Some("STATUS_INVALID_DEVICE_REQUEST"),
            Status::BUFFER_TOO_SMALL => Some("STATUS_BUFFER_TOO_SMALL"),
            Status::DEVICE_NOT_READY => Some("STATUS_DEVICE_NOT_READY"),
            Status::INTERNAL_ERROR => Some("STATUS_INTERNAL_ERROR"),
            Status::CANCELLED => Some("STATUS_CANCELLED"),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08X})", name, self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}
