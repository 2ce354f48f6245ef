// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request lifecycle state machine.
//!
//! ```text
//! Queued ──claim──▶ Dispatched ──▶ Completed
//!   │                   │      └──▶ Failed
//!   └──────stop─────────┴─────────▶ Cancelled
//! ```
//!
//! The state lives in an [`AtomicU8`] shared between the request, its caller
//! handle and the queue. Every transition is a compare-and-set from the state
//! the actor observed, so when two actors race for the terminal transition
//! exactly one of them wins and the other gets a [`LifecycleError`]. The
//! winner is the only one allowed to set the result and notify the caller.

use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use crate::errors::{ErrorKind, LifecycleError, Status};
use crate::policy::ValidationOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Queued,
    Dispatched,
    Completed,
    Cancelled,
    Failed,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Cancelled | RequestState::Failed
        )
    }

    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Queued, Dispatched)
                | (Queued, Cancelled)
                | (Dispatched, Completed)
                | (Dispatched, Failed)
                | (Dispatched, Cancelled)
        )
    }
}

const QUEUED: u8 = 0;
const DISPATCHED: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELLED: u8 = 3;
const FAILED: u8 = 4;
// A finisher won the CAS but has not published the result yet. Readers keep
// seeing the state it left until the terminal state is stored.
const FINISHING_QUEUED: u8 = 5;
const FINISHING_DISPATCHED: u8 = 6;

const fn encode_state(state: RequestState) -> u8 {
    match state {
        RequestState::Queued => QUEUED,
        RequestState::Dispatched => DISPATCHED,
        RequestState::Completed => COMPLETED,
        RequestState::Cancelled => CANCELLED,
        RequestState::Failed => FAILED,
    }
}

const fn decode_state(value: u8) -> RequestState {
    match value {
        QUEUED | FINISHING_QUEUED => RequestState::Queued,
        DISPATCHED | FINISHING_DISPATCHED => RequestState::Dispatched,
        COMPLETED => RequestState::Completed,
        CANCELLED => RequestState::Cancelled,
        _ => RequestState::Failed,
    }
}

const fn encode_finishing(from: RequestState) -> u8 {
    match from {
        RequestState::Queued => FINISHING_QUEUED,
        _ => FINISHING_DISPATCHED,
    }
}

const fn is_finishing(value: u8) -> bool {
    matches!(value, FINISHING_QUEUED | FINISHING_DISPATCHED)
}

/// Terminal result of a request, written exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestResult {
    pub state: RequestState,
    pub status: Status,
    pub bytes_written: usize,
    pub error: Option<ErrorKind>,
    pub validation: Option<ValidationOutcome>,
}

impl RequestResult {
    pub fn completed(bytes_written: usize, validation: Option<ValidationOutcome>) -> Self {
        Self {
            state: RequestState::Completed,
            status: Status::SUCCESS,
            bytes_written,
            error: None,
            validation,
        }
    }

    pub fn failed(error: ErrorKind) -> Self {
        Self {
            state: RequestState::Failed,
            status: error.status(),
            bytes_written: 0,
            error: Some(error),
            validation: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            state: RequestState::Cancelled,
            status: Status::CANCELLED,
            bytes_written: 0,
            error: None,
            validation: None,
        }
    }

    /// A dispatched request whose worker went away without completing it.
    pub fn abandoned() -> Self {
        Self {
            state: RequestState::Failed,
            status: Status::INTERNAL_ERROR,
            bytes_written: 0,
            error: None,
            validation: None,
        }
    }

    /// True if the policy accepted the submitted code.
    pub fn accepted(&self) -> bool {
        self.validation.map(|v| v.accepted).unwrap_or(false)
    }
}

/// Shared lifecycle state of one request.
#[derive(Debug)]
pub struct LifecycleCell {
    state: AtomicU8,
    result: OnceLock<RequestResult>,
}

impl LifecycleCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(encode_state(RequestState::Queued)),
            result: OnceLock::new(),
        }
    }

    /// Current state. A terminal state is only reported once its result is
    /// readable through [`LifecycleCell::result`].
    pub fn state(&self) -> RequestState {
        match self.result.get() {
            Some(result) => result.state,
            None => decode_state(self.state.load(Ordering::Acquire)),
        }
    }

    /// Terminal result, once one has been recorded.
    pub fn result(&self) -> Option<&RequestResult> {
        self.result.get()
    }

    /// Queued -> Dispatched.
    pub fn claim(&self) -> Result<(), LifecycleError> {
        self.state
            .compare_exchange(QUEUED, DISPATCHED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| LifecycleError::IllegalTransition {
                from: decode_state(actual),
                to: RequestState::Dispatched,
            })
    }

    /// Moves to `result.state` and records `result`.
    ///
    /// Fails without side effects if the request already reached a terminal
    /// state or the move is not a legal transition from the current one.
    pub fn finish(&self, result: RequestResult) -> Result<(), LifecycleError> {
        let mut raw = self.state.load(Ordering::Acquire);
        loop {
            let current = decode_state(raw);
            if current.is_terminal() || is_finishing(raw) {
                return Err(self.terminal_error());
            }
            if !current.can_transition_to(result.state) {
                return Err(LifecycleError::IllegalTransition {
                    from: current,
                    to: result.state,
                });
            }
            match self.state.compare_exchange(
                raw,
                encode_finishing(current),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => raw = actual,
            }
        }

        // Only the CAS winner reaches this point, so the set cannot fail.
        let _ = self.result.set(result);
        self.state.store(encode_state(result.state), Ordering::Release);
        Ok(())
    }

    /// Error for a losing finisher. The winner publishes its result right
    /// after its CAS, so the wait is a handful of instructions at most.
    fn terminal_error(&self) -> LifecycleError {
        loop {
            if let Some(result) = self.result.get() {
                return LifecycleError::AlreadyTerminal(result.state);
            }
            std::hint::spin_loop();
        }
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new()
    }
}
