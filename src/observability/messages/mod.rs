// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with typed fields at the right level.
//!
//! * `request` - per-request lifecycle events
//! * `queue` - dispatch queue start, stop and drain

pub mod queue;
pub mod request;

/// Emits a message as a structured `tracing` event.
pub trait StructuredLog {
    fn log(&self);
}
