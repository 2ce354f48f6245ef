// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while routing, validating and completing control requests.
//!
//! None of these errors halt the dispatch core. Each one is attached to the
//! terminal result of the request it belongs to and handed back to the caller
//! through the normal completion path.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::engine::{RequestId, RequestState};
use crate::errors::Status;

/// Which caller-supplied region a buffer check was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Input,
    Output,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Input => write!(f, "input"),
            RegionKind::Output => write!(f, "output"),
        }
    }
}

/// Errors surfaced by the dispatch core for a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A region attached to the request is smaller than the operation requires.
    #[error("{region} buffer too small: {actual} bytes, operation requires at least {required}")]
    BufferTooSmall {
        region: RegionKind,
        required: usize,
        actual: usize,
    },

    /// No handler is mapped to the operation code.
    #[error("unsupported operation code 0x{code:08X}")]
    UnsupportedOperation { code: u32 },

    /// The queue has begun stopping and no longer accepts requests.
    #[error("dispatch queue is shutting down")]
    ShuttingDown,

    /// A second completion was attempted on an already terminal request.
    #[error("request {request_id} already reached terminal state {state:?}")]
    InternalDoubleCompletion {
        request_id: RequestId,
        state: RequestState,
    },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            DispatchError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            DispatchError::ShuttingDown => ErrorKind::ShuttingDown,
            DispatchError::InternalDoubleCompletion { .. } => ErrorKind::InternalDoubleCompletion,
        }
    }

    pub fn status(&self) -> Status {
        self.kind().status()
    }
}

/// Copyable discriminant of [`DispatchError`], stored in request results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BufferTooSmall,
    UnsupportedOperation,
    ShuttingDown,
    InternalDoubleCompletion,
}

impl ErrorKind {
    pub fn status(self) -> Status {
        match self {
            ErrorKind::BufferTooSmall => Status::BUFFER_TOO_SMALL,
            ErrorKind::UnsupportedOperation => Status::INVALID_DEVICE_REQUEST,
            ErrorKind::ShuttingDown => Status::DEVICE_NOT_READY,
            ErrorKind::InternalDoubleCompletion => Status::INTERNAL_ERROR,
        }
    }
}

/// Rejected lifecycle transition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition { from: RequestState, to: RequestState },

    #[error("request already terminal in state {0:?}")]
    AlreadyTerminal(RequestState),
}
