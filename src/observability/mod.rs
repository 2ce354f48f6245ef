// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability for the dispatch core.
//!
//! The core reports what happens to each request as a [`DispatchEvent`]
//! handed to an injected [`DiagnosticSink`](crate::traits::DiagnosticSink).
//! Two sinks ship with the crate:
//!
//! * [`TracingSink`] - turns events into structured `tracing` records via the
//!   message types in [`messages`]
//! * [`MemorySink`] - keeps events in memory for tests and summaries
//!
//! Message types follow a struct-based pattern with a `Display` impl so log
//! text lives in one place instead of being scattered as string literals.
//!
//! # Usage
//!
//! ```rust
//! use otp_ioctl_core::observability::messages::{queue::StopRequested, StructuredLog};
//!
//! let msg = StopRequested {
//!     pending: 3,
//!     in_flight: 1,
//! };
//!
//! msg.log();
//! ```

mod events;
pub mod messages;
mod sink;

pub use events::DispatchEvent;
pub use sink::{MemorySink, TracingSink};
