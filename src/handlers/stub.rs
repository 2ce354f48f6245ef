// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Handlers for exercising the dispatch queue under controlled timing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::errors::DispatchError;
use crate::traits::{Handled, OperationHandler, RequestContext};

/// Blocks every request until the test releases it, and counts invocations.
///
/// On release it writes one byte to the output region so tests can check the
/// region was written exactly once.
#[derive(Clone)]
pub struct GateHandler {
    gate: Arc<Semaphore>,
    pub started: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
}

impl GateHandler {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperationHandler for GateHandler {
    async fn process(&self, ctx: RequestContext<'_>) -> Result<Handled, DispatchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        let bytes_written = ctx.output.write(&[0x5A])?;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Handled {
            bytes_written,
            validation: None,
        })
    }

    fn name(&self) -> &'static str {
        "gate"
    }
}

/// Panics inside the worker to exercise abandoned-request completion.
pub struct PanickingHandler;

#[async_trait]
impl OperationHandler for PanickingHandler {
    async fn process(&self, _ctx: RequestContext<'_>) -> Result<Handled, DispatchError> {
        panic!("handler failure injected by test");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}
