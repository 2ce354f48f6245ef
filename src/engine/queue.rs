// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dispatch queue: FIFO acceptance, parallel execution, explicit stop.
//!
//! # Architecture
//!
//! ```text
//! submit() ──▶ [ pending: VecDeque<Request> ] ──▶ worker 0..N ──▶ router ──▶ handler
//!                 ▲ one Mutex, one Semaphore permit per queued request
//! stop()  ────────┘ flip to stopping, drain, cancel, close, join
//! ```
//!
//! The queue state mutex is the single synchronization point between the
//! arrival path and the pool. A worker pops the head and claims it
//! (Queued -> Dispatched) while holding that lock, so a request is handed to
//! exactly one worker and the stop protocol can never observe it half-claimed:
//! every request is either still pending (and stop cancels it) or already
//! owned by a worker (and runs to completion).
//!
//! Workers sleep on a [`Semaphore`] whose permits count queued requests.
//! Closing the semaphore is what tells idle workers to exit.
//!
//! # Stop semantics
//!
//! 1. Under the state lock: mark stopping, take every pending request.
//! 2. Cancel the stop token (observable by handlers) and close the semaphore.
//! 3. Complete each drained request as Cancelled; none reaches a handler.
//! 4. Join the workers, bounded by `drain_timeout` if configured. In-flight
//!    requests are never interrupted. If the timeout elapses first the stop
//!    is acknowledged as [`StopAck::Deferred`] and the workers keep running
//!    until their requests complete.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::handle::RequestHandle;
use super::request::{Request, RequestId};
use super::router::ControlCodeRouter;
use crate::buffers::{InputRegion, OutputRegion};
use crate::errors::DispatchError;
use crate::observability::DispatchEvent;
use crate::traits::DiagnosticSink;

/// Worker pool sizing and drain behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    pub workers: usize,
    /// Upper bound on how long `stop` waits for in-flight work. `None` waits
    /// until every worker has exited.
    pub drain_timeout: Option<Duration>,
}

impl DispatchOptions {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            drain_timeout: None,
        }
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }
}

impl Default for DispatchOptions {
    /// One worker per available core, falling back to 4.
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(workers)
    }
}

/// What the stop protocol did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DrainReport {
    /// Queued requests completed as Cancelled without reaching a handler.
    pub cancelled: usize,
    /// Requests already owned by a worker when stop began.
    pub in_flight_at_stop: usize,
}

/// Acknowledgement returned by [`DispatchQueue::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAck {
    /// Every worker exited; every accepted request is terminal.
    Drained(DrainReport),
    /// The drain timeout elapsed first. Remaining in-flight requests will
    /// still complete exactly once.
    Deferred(DrainReport),
}

impl StopAck {
    pub fn report(&self) -> DrainReport {
        match self {
            StopAck::Drained(report) | StopAck::Deferred(report) => *report,
        }
    }

    pub fn is_drained(&self) -> bool {
        matches!(self, StopAck::Drained(_))
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Request>,
    stopping: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    ready: Semaphore,
    stop: CancellationToken,
    router: ControlCodeRouter,
    sink: Arc<dyn DiagnosticSink>,
    next_id: AtomicU64,
    in_flight: Arc<AtomicUsize>,
}

/// Counts one request as in flight until dropped.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A request owned by a worker.
///
/// Fields drop in declaration order: the in-flight count is released before
/// an unfinished request completes itself from its `Drop`.
struct Claimed {
    in_flight: InFlight,
    request: Request,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // No critical section can leave the state half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pops and claims the oldest pending request.
    fn claim_next(&self) -> Option<Claimed> {
        let mut state = self.lock_state();
        while let Some(request) = state.pending.pop_front() {
            if request.claim().is_ok() {
                return Some(Claimed {
                    in_flight: InFlight::enter(&self.in_flight),
                    request,
                });
            }
        }
        None
    }

    /// Flips to stopping and takes the pending requests. Returns `None` if
    /// stop had already begun.
    fn begin_stop(&self) -> Option<(Vec<Request>, usize)> {
        let drained = {
            let mut state = self.lock_state();
            if state.stopping {
                return None;
            }
            state.stopping = true;
            let in_flight = self.in_flight.load(Ordering::Acquire);
            (state.pending.drain(..).collect::<Vec<_>>(), in_flight)
        };
        self.stop.cancel();
        self.ready.close();
        Some(drained)
    }

    fn cancel_all(&self, drained: Vec<Request>) -> usize {
        let mut cancelled = 0;
        for request in drained {
            let (id, code, accepted_at) =
                (request.id(), request.operation_code(), request.accepted_at());
            match request.cancel() {
                Ok(result) => {
                    cancelled += 1;
                    self.sink.record(&DispatchEvent::Finished {
                        request_id: id,
                        operation_code: code,
                        result,
                        elapsed: accepted_at.elapsed(),
                    });
                }
                Err(err) => self.record_double_completion(code, &err),
            }
        }
        cancelled
    }

    async fn execute(&self, claimed: Claimed, worker: usize) {
        // Declared before the guard so a panic drops the guard first.
        let mut request = claimed.request;
        let in_flight = claimed.in_flight;

        let handler = self.router.route(request.operation_code()).clone();
        self.sink.record(&DispatchEvent::Dispatched {
            request_id: request.id(),
            operation_code: request.operation_code(),
            worker,
            handler: handler.name(),
        });

        let outcome = handler.process(request.context(&self.stop)).await;

        let (id, code, accepted_at) = (request.id(), request.operation_code(), request.accepted_at());
        drop(in_flight);
        match request.complete(outcome) {
            Ok(result) => self.sink.record(&DispatchEvent::Finished {
                request_id: id,
                operation_code: code,
                result,
                elapsed: accepted_at.elapsed(),
            }),
            Err(err) => self.record_double_completion(code, &err),
        }
    }

    fn record_double_completion(&self, operation_code: u32, err: &DispatchError) {
        if let DispatchError::InternalDoubleCompletion { request_id, state } = err {
            self.sink.record(&DispatchEvent::DoubleCompletion {
                request_id: *request_id,
                operation_code,
                state: *state,
            });
        }
    }
}

/// Accepts control requests and executes them on a pool of tokio tasks.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use otp_ioctl_core::config::consts::IOCTL_USBOTP_VALIDATE_OTP;
/// use otp_ioctl_core::engine::{ControlCodeRouter, DispatchOptions, DispatchQueue, RequestState};
/// use otp_ioctl_core::observability::TracingSink;
/// use otp_ioctl_core::policy::StaticCodePolicy;
///
/// # #[tokio::main]
/// # async fn main() {
/// let router = ControlCodeRouter::otp(IOCTL_USBOTP_VALIDATE_OTP, Arc::new(StaticCodePolicy::new(123_456)));
/// let queue = DispatchQueue::start(router, Arc::new(TracingSink), DispatchOptions::new(2));
///
/// let handle = queue
///     .submit(IOCTL_USBOTP_VALIDATE_OTP, 123_456u32.to_le_bytes().to_vec(), vec![0; 4])
///     .unwrap();
/// let completion = handle.wait().await;
/// assert_eq!(completion.result.state, RequestState::Completed);
/// assert!(completion.result.accepted());
///
/// assert!(queue.stop().await.is_drained());
/// # }
/// ```
pub struct DispatchQueue {
    shared: Arc<Shared>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    options: DispatchOptions,
}

impl DispatchQueue {
    /// Spawns the worker pool on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start(
        router: ControlCodeRouter,
        sink: Arc<dyn DiagnosticSink>,
        options: DispatchOptions,
    ) -> Self {
        let workers = options.workers.max(1);
        let routes = router.codes().count();
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            ready: Semaphore::new(0),
            stop: CancellationToken::new(),
            router,
            sink,
            next_id: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
        });

        let handles = (0..workers)
            .map(|worker| tokio::spawn(run_worker(worker, shared.clone())))
            .collect();

        shared.sink.record(&DispatchEvent::QueueStarted { workers, routes });

        Self {
            shared,
            workers: tokio::sync::Mutex::new(handles),
            options: DispatchOptions { workers, ..options },
        }
    }

    /// Accepts one request at the tail of the queue.
    ///
    /// Fails with [`DispatchError::ShuttingDown`] once stop has begun; such
    /// a request is never created or queued.
    pub fn submit(
        &self,
        operation_code: u32,
        input: impl Into<InputRegion>,
        output: impl Into<OutputRegion>,
    ) -> Result<RequestHandle, DispatchError> {
        let (input, output) = (input.into(), output.into());
        let (input_len, output_len) = (input.len(), output.capacity());

        let (id, handle) = {
            let mut state = self.shared.lock_state();
            if state.stopping {
                drop(state);
                let err = DispatchError::ShuttingDown;
                self.shared.sink.record(&DispatchEvent::Rejected {
                    operation_code,
                    error: err.kind(),
                });
                return Err(err);
            }
            let id = RequestId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
            let (request, handle) = Request::new(id, operation_code, input, output);
            state.pending.push_back(request);
            (id, handle)
        };
        self.shared.ready.add_permits(1);

        self.shared.sink.record(&DispatchEvent::Submitted {
            request_id: id,
            operation_code,
            input_len,
            output_len,
        });
        Ok(handle)
    }

    /// Signals stop and drains. Safe to call more than once; later calls only
    /// wait for the workers again.
    pub async fn stop(&self) -> StopAck {
        let report = match self.shared.begin_stop() {
            Some((drained, in_flight_at_stop)) => {
                self.shared.sink.record(&DispatchEvent::StopRequested {
                    pending: drained.len(),
                    in_flight: in_flight_at_stop,
                });
                DrainReport {
                    cancelled: self.shared.cancel_all(drained),
                    in_flight_at_stop,
                }
            }
            None => DrainReport::default(),
        };

        let joined = async {
            let mut workers = self.workers.lock().await;
            while let Some(worker) = workers.last_mut() {
                // A worker only ends early if the runtime is shutting down.
                let _ = worker.await;
                workers.pop();
            }
        };

        let drained = match self.options.drain_timeout {
            Some(timeout) => tokio::time::timeout(timeout, joined).await.is_ok(),
            None => {
                joined.await;
                true
            }
        };

        self.shared.sink.record(&DispatchEvent::Drained {
            cancelled: report.cancelled,
            in_flight_at_stop: report.in_flight_at_stop,
            deferred: !drained,
        });

        if drained {
            StopAck::Drained(report)
        } else {
            StopAck::Deferred(report)
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.lock_state().stopping
    }

    /// Requests accepted but not yet claimed by a worker.
    pub fn pending(&self) -> usize {
        self.shared.lock_state().pending.len()
    }

    /// Requests owned by a worker that have not begun completing.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn router(&self) -> &ControlCodeRouter {
        &self.shared.router
    }
}

impl Drop for DispatchQueue {
    /// Dropping without `stop` still refuses new work and cancels everything
    /// still queued; in-flight requests finish on their detached workers.
    fn drop(&mut self) {
        if let Some((drained, _)) = self.shared.begin_stop() {
            self.shared.cancel_all(drained);
        }
    }
}

async fn run_worker(worker: usize, shared: Arc<Shared>) {
    loop {
        match shared.ready.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => break,
        }
        let Some(claimed) = shared.claim_next() else {
            continue;
        };

        // Run each request in its own task so a panicking handler costs one
        // request (completed as Failed by its Drop) and not the worker.
        let task_shared = shared.clone();
        let _ = tokio::spawn(async move { task_shared.execute(claimed, worker).await }).await;
    }
}
