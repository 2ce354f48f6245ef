// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-request lifecycle events.
//!
//! Submitted codes are never logged; only the policy verdict is.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use super::StructuredLog;
use crate::engine::{RequestId, RequestResult, RequestState};
use crate::errors::ErrorKind;

/// Request accepted into the queue.
///
/// # Log Level
/// `debug!` - High-volume per-request event
pub struct RequestSubmitted {
    pub request_id: RequestId,
    pub operation_code: u32,
    pub input_len: usize,
    pub output_len: usize,
}

impl Display for RequestSubmitted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} queued: ioctl=0x{:08X}, input={} bytes, output={} bytes",
            self.request_id, self.operation_code, self.input_len, self.output_len
        )
    }
}

impl StructuredLog for RequestSubmitted {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id.0,
            operation_code = self.operation_code,
            input_len = self.input_len,
            output_len = self.output_len,
            "{}", self
        );
    }
}

/// Request refused before it was queued.
///
/// # Log Level
/// `warn!` - Caller-visible refusal
///
/// # Example
/// ```
/// use otp_ioctl_core::errors::ErrorKind;
/// use otp_ioctl_core::observability::messages::request::RequestRejected;
///
/// let msg = RequestRejected {
///     operation_code: 0x9C41_2400,
///     error: ErrorKind::ShuttingDown,
/// };
///
/// assert_eq!(msg.to_string(), "Request for ioctl=0x9C412400 rejected: ShuttingDown");
/// ```
pub struct RequestRejected {
    pub operation_code: u32,
    pub error: ErrorKind,
}

impl Display for RequestRejected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request for ioctl=0x{:08X} rejected: {:?}",
            self.operation_code, self.error
        )
    }
}

impl StructuredLog for RequestRejected {
    fn log(&self) {
        tracing::warn!(
            operation_code = self.operation_code,
            error = ?self.error,
            "{}", self
        );
    }
}

/// Request claimed by a worker.
///
/// # Log Level
/// `debug!` - High-volume per-request event
pub struct RequestDispatched<'a> {
    pub request_id: RequestId,
    pub operation_code: u32,
    pub worker: usize,
    pub handler: &'a str,
}

impl Display for RequestDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} dispatched to worker {} (handler '{}')",
            self.request_id, self.worker, self.handler
        )
    }
}

impl StructuredLog for RequestDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id.0,
            operation_code = self.operation_code,
            worker = self.worker,
            handler = self.handler,
            "{}", self
        );
    }
}

/// Request reached its terminal state.
///
/// # Log Level
/// `info!` for Completed, `warn!` for Failed and Cancelled
pub struct RequestFinished<'a> {
    pub request_id: RequestId,
    pub operation_code: u32,
    pub result: &'a RequestResult,
    pub elapsed: Duration,
}

impl Display for RequestFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Request {} {:?}: status={}, bytes_written={}",
            self.request_id, self.result.state, self.result.status, self.result.bytes_written
        )?;
        if let Some(validation) = self.result.validation {
            write!(f, ", accepted={}", validation.accepted)?;
        }
        write!(f, ", elapsed={:?}", self.elapsed)
    }
}

impl StructuredLog for RequestFinished<'_> {
    fn log(&self) {
        let accepted = self.result.validation.map(|v| v.accepted);
        match self.result.state {
            RequestState::Completed => tracing::info!(
                request_id = self.request_id.0,
                operation_code = self.operation_code,
                state = ?self.result.state,
                status = self.result.status.0,
                bytes_written = self.result.bytes_written,
                accepted = ?accepted,
                elapsed_us = self.elapsed.as_micros() as u64,
                "{}", self
            ),
            _ => tracing::warn!(
                request_id = self.request_id.0,
                operation_code = self.operation_code,
                state = ?self.result.state,
                status = self.result.status.0,
                error = ?self.result.error,
                elapsed_us = self.elapsed.as_micros() as u64,
                "{}", self
            ),
        }
    }
}

/// A second completion was attempted and refused.
///
/// # Log Level
/// `error!` - Concurrency bug in the dispatch core
pub struct DoubleCompletionDetected {
    pub request_id: RequestId,
    pub operation_code: u32,
    pub state: RequestState,
}

impl Display for DoubleCompletionDetected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Refused second completion of request {} already in {:?}",
            self.request_id, self.state
        )
    }
}

impl StructuredLog for DoubleCompletionDetected {
    fn log(&self) {
        tracing::error!(
            request_id = self.request_id.0,
            operation_code = self.operation_code,
            state = ?self.state,
            "{}", self
        );
    }
}
