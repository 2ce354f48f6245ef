// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for dispatch queue start, stop and drain.

use std::fmt::{Display, Formatter};

use super::StructuredLog;

/// Worker pool started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct QueueStarted {
    pub workers: usize,
    pub routes: usize,
}

impl Display for QueueStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatch queue started: {} workers, {} mapped control codes",
            self.workers, self.routes
        )
    }
}

impl StructuredLog for QueueStarted {
    fn log(&self) {
        tracing::info!(workers = self.workers, routes = self.routes, "{}", self);
    }
}

/// Stop signaled; new requests are refused from here on.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StopRequested {
    pub pending: usize,
    pub in_flight: usize,
}

impl Display for StopRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stop requested: cancelling {} queued requests, waiting on {} in flight",
            self.pending, self.in_flight
        )
    }
}

impl StructuredLog for StopRequested {
    fn log(&self) {
        tracing::info!(pending = self.pending, in_flight = self.in_flight, "{}", self);
    }
}

/// Drain finished, or gave up waiting and deferred.
///
/// # Log Level
/// `info!` when drained, `warn!` when deferred
pub struct DrainCompleted {
    pub cancelled: usize,
    pub in_flight_at_stop: usize,
    pub deferred: bool,
}

impl Display for DrainCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let outcome = if self.deferred { "deferred" } else { "drained" };
        write!(
            f,
            "Dispatch queue {}: {} cancelled, {} were in flight at stop",
            outcome, self.cancelled, self.in_flight_at_stop
        )
    }
}

impl StructuredLog for DrainCompleted {
    fn log(&self) {
        if self.deferred {
            tracing::warn!(
                cancelled = self.cancelled,
                in_flight_at_stop = self.in_flight_at_stop,
                "{}", self
            );
        } else {
            tracing::info!(
                cancelled = self.cancelled,
                in_flight_at_stop = self.in_flight_at_stop,
                "{}", self
            );
        }
    }
}
