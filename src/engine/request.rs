// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::handle::RequestHandle;
use super::lifecycle::{LifecycleCell, RequestResult, RequestState};
use crate::buffers::{InputRegion, OutputRegion};
use crate::errors::{DispatchError, LifecycleError};
use crate::traits::{Handled, RequestContext};

/// Identifier assigned to a request when the queue accepts it.
///
/// Ids increase monotonically in acceptance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the caller gets back once its request is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: RequestId,
    pub operation_code: u32,
    pub result: RequestResult,
    /// The caller's output region, handed back after the single write (if any).
    pub output: OutputRegion,
}

/// A unit of work owned by exactly one actor at a time: the queue while it is
/// Queued, then the worker that claimed it.
///
/// Consuming methods ([`Request::complete`], [`Request::cancel`]) are the only
/// way to reach a terminal state. A request dropped before that is completed
/// from its `Drop` impl so the caller always receives an answer.
pub struct Request {
    id: RequestId,
    operation_code: u32,
    input: InputRegion,
    output: OutputRegion,
    lifecycle: Arc<LifecycleCell>,
    completion: Option<oneshot::Sender<Completion>>,
    accepted_at: Instant,
}

impl Request {
    pub(crate) fn new(
        id: RequestId,
        operation_code: u32,
        input: InputRegion,
        output: OutputRegion,
    ) -> (Request, RequestHandle) {
        let lifecycle = Arc::new(LifecycleCell::new());
        let (sender, receiver) = oneshot::channel();
        let request = Request {
            id,
            operation_code,
            input,
            output,
            lifecycle: lifecycle.clone(),
            completion: Some(sender),
            accepted_at: Instant::now(),
        };
        (request, RequestHandle::new(id, lifecycle, receiver))
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn operation_code(&self) -> u32 {
        self.operation_code
    }

    pub fn state(&self) -> RequestState {
        self.lifecycle.state()
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    pub fn output_len(&self) -> usize {
        self.output.capacity()
    }

    pub fn accepted_at(&self) -> Instant {
        self.accepted_at
    }

    pub(crate) fn claim(&self) -> Result<(), LifecycleError> {
        self.lifecycle.claim()
    }

    pub(crate) fn context<'a>(&'a mut self, stop: &'a CancellationToken) -> RequestContext<'a> {
        RequestContext {
            id: self.id,
            operation_code: self.operation_code,
            input: &self.input,
            output: &mut self.output,
            stop,
        }
    }

    /// Dispatched -> Completed or Failed, depending on the handler outcome.
    pub(crate) fn complete(
        mut self,
        outcome: Result<Handled, DispatchError>,
    ) -> Result<RequestResult, DispatchError> {
        let result = match outcome {
            Ok(handled) => RequestResult::completed(handled.bytes_written, handled.validation),
            Err(err) => RequestResult::failed(err.kind()),
        };
        self.finish(result)
    }

    /// Queued or Dispatched -> Cancelled.
    pub(crate) fn cancel(mut self) -> Result<RequestResult, DispatchError> {
        self.finish(RequestResult::cancelled())
    }

    fn finish(&mut self, result: RequestResult) -> Result<RequestResult, DispatchError> {
        self.lifecycle.finish(result).map_err(|err| {
            let state = match err {
                LifecycleError::AlreadyTerminal(state) => state,
                LifecycleError::IllegalTransition { from, .. } => from,
            };
            DispatchError::InternalDoubleCompletion {
                request_id: self.id,
                state,
            }
        })?;

        if let Some(sender) = self.completion.take() {
            let completion = Completion {
                id: self.id,
                operation_code: self.operation_code,
                result,
                output: std::mem::take(&mut self.output),
            };
            // The caller may have stopped listening; the request is terminal either way.
            let _ = sender.send(completion);
        }
        Ok(result)
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        if self.completion.is_none() {
            return;
        }
        let fallback = match self.lifecycle.state() {
            RequestState::Queued => RequestResult::cancelled(),
            _ => RequestResult::abandoned(),
        };
        let _ = self.finish(fallback);
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("operation_code", &format_args!("0x{:08X}", self.operation_code))
            .field("input_len", &self.input.len())
            .field("output_len", &self.output.capacity())
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, RegionKind, Status};

    fn new_request(input: Vec<u8>, output: usize) -> (Request, RequestHandle) {
        Request::new(
            RequestId(1),
            0x9C41_2400,
            InputRegion::new(input),
            OutputRegion::with_capacity(output),
        )
    }

    #[tokio::test]
    async fn test_complete_delivers_output_to_caller() {
        let (mut request, handle) = new_request(vec![1, 0, 0, 0], 4);
        request.claim().unwrap();
        let stop = CancellationToken::new();
        {
            let ctx = request.context(&stop);
            ctx.output.write(&[1, 0, 0, 0]).unwrap();
        }
        let result = request
            .complete(Ok(Handled {
                bytes_written: 4,
                validation: None,
            }))
            .unwrap();
        assert_eq!(result.state, RequestState::Completed);

        let completion = handle.wait().await;
        assert_eq!(completion.result, result);
        assert_eq!(completion.output.as_slice(), &[1, 0, 0, 0]);
        assert_eq!(completion.output.write_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_request_reports_zero_bytes() {
        let (request, handle) = new_request(vec![1, 2], 4);
        request.claim().unwrap();
        let err = DispatchError::BufferTooSmall {
            region: RegionKind::Input,
            required: 4,
            actual: 2,
        };
        request.complete(Err(err)).unwrap();

        let completion = handle.wait().await;
        assert_eq!(completion.result.state, RequestState::Failed);
        assert_eq!(completion.result.error, Some(ErrorKind::BufferTooSmall));
        assert_eq!(completion.result.status, Status::BUFFER_TOO_SMALL);
        assert_eq!(completion.result.bytes_written, 0);
        assert_eq!(completion.output.write_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_queued_request_is_cancelled() {
        let (request, handle) = new_request(vec![0; 4], 4);
        drop(request);
        let completion = handle.wait().await;
        assert_eq!(completion.result.state, RequestState::Cancelled);
    }

    #[tokio::test]
    async fn test_dropped_dispatched_request_is_failed() {
        let (request, handle) = new_request(vec![0; 4], 4);
        request.claim().unwrap();
        drop(request);
        let completion = handle.wait().await;
        assert_eq!(completion.result.state, RequestState::Failed);
        assert_eq!(completion.result.status, Status::INTERNAL_ERROR);
    }

    #[test]
    fn test_double_completion_is_reported_not_overwritten() {
        let (request, handle) = new_request(vec![0; 4], 4);
        let lifecycle = request.lifecycle.clone();
        request.cancel().unwrap();

        // A second request object sharing the cell stands in for a buggy second completer.
        let (mut twin, _twin_handle) = new_request(vec![0; 4], 4);
        twin.lifecycle = lifecycle;
        let err = twin.complete(Ok(Handled::default())).unwrap_err();
        assert_eq!(
            err,
            DispatchError::InternalDoubleCompletion {
                request_id: RequestId(1),
                state: RequestState::Cancelled,
            }
        );
        assert_eq!(handle.state(), RequestState::Cancelled);
        assert_eq!(handle.result().unwrap().state, RequestState::Cancelled);
    }
}
