// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, PoisonError};

use super::events::DispatchEvent;
use super::messages::queue::{DrainCompleted, QueueStarted, StopRequested};
use super::messages::request::{
    DoubleCompletionDetected, RequestDispatched, RequestFinished, RequestRejected, RequestSubmitted,
};
use super::messages::StructuredLog;
use crate::traits::DiagnosticSink;

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::QueueStarted { workers, routes } => QueueStarted {
                workers: *workers,
                routes: *routes,
            }
            .log(),
            DispatchEvent::Submitted {
                request_id,
                operation_code,
                input_len,
                output_len,
            } => RequestSubmitted {
                request_id: *request_id,
                operation_code: *operation_code,
                input_len: *input_len,
                output_len: *output_len,
            }
            .log(),
            DispatchEvent::Rejected {
                operation_code,
                error,
            } => RequestRejected {
                operation_code: *operation_code,
                error: *error,
            }
            .log(),
            DispatchEvent::Dispatched {
                request_id,
                operation_code,
                worker,
                handler,
            } => RequestDispatched {
                request_id: *request_id,
                operation_code: *operation_code,
                worker: *worker,
                handler,
            }
            .log(),
            DispatchEvent::Finished {
                request_id,
                operation_code,
                result,
                elapsed,
            } => RequestFinished {
                request_id: *request_id,
                operation_code: *operation_code,
                result,
                elapsed: *elapsed,
            }
            .log(),
            DispatchEvent::DoubleCompletion {
                request_id,
                operation_code,
                state,
            } => DoubleCompletionDetected {
                request_id: *request_id,
                operation_code: *operation_code,
                state: *state,
            }
            .log(),
            DispatchEvent::StopRequested { pending, in_flight } => StopRequested {
                pending: *pending,
                in_flight: *in_flight,
            }
            .log(),
            DispatchEvent::Drained {
                cancelled,
                in_flight_at_stop,
                deferred,
            } => DrainCompleted {
                cancelled: *cancelled,
                in_flight_at_stop: *in_flight_at_stop,
                deferred: *deferred,
            }
            .log(),
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DispatchEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events with the given [`DispatchEvent::name`].
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: &DispatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
