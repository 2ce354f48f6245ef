// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::time::Duration;

use crate::engine::{RequestId, RequestResult, RequestState};
use crate::errors::ErrorKind;

/// Structured event emitted by the dispatch core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    QueueStarted {
        workers: usize,
        routes: usize,
    },
    Submitted {
        request_id: RequestId,
        operation_code: u32,
        input_len: usize,
        output_len: usize,
    },
    /// Refused at the door; no request was created.
    Rejected {
        operation_code: u32,
        error: ErrorKind,
    },
    Dispatched {
        request_id: RequestId,
        operation_code: u32,
        worker: usize,
        handler: &'static str,
    },
    /// Terminal state reached; `elapsed` is measured from acceptance.
    Finished {
        request_id: RequestId,
        operation_code: u32,
        result: RequestResult,
        elapsed: Duration,
    },
    DoubleCompletion {
        request_id: RequestId,
        operation_code: u32,
        state: RequestState,
    },
    StopRequested {
        pending: usize,
        in_flight: usize,
    },
    Drained {
        cancelled: usize,
        in_flight_at_stop: usize,
        deferred: bool,
    },
}

impl DispatchEvent {
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            DispatchEvent::Submitted { request_id, .. }
            | DispatchEvent::Dispatched { request_id, .. }
            | DispatchEvent::Finished { request_id, .. }
            | DispatchEvent::DoubleCompletion { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DispatchEvent::QueueStarted { .. } => "queue_started",
            DispatchEvent::Submitted { .. } => "submitted",
            DispatchEvent::Rejected { .. } => "rejected",
            DispatchEvent::Dispatched { .. } => "dispatched",
            DispatchEvent::Finished { .. } => "finished",
            DispatchEvent::DoubleCompletion { .. } => "double_completion",
            DispatchEvent::StopRequested { .. } => "stop_requested",
            DispatchEvent::Drained { .. } => "drained",
        }
    }
}
