// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::sync::oneshot;

use super::lifecycle::{LifecycleCell, RequestResult, RequestState};
use super::request::{Completion, RequestId};
use crate::buffers::OutputRegion;

/// Caller-side view of a submitted request.
#[derive(Debug)]
pub struct RequestHandle {
    id: RequestId,
    lifecycle: Arc<LifecycleCell>,
    receiver: oneshot::Receiver<Completion>,
}

impl RequestHandle {
    pub(crate) fn new(
        id: RequestId,
        lifecycle: Arc<LifecycleCell>,
        receiver: oneshot::Receiver<Completion>,
    ) -> Self {
        Self {
            id,
            lifecycle,
            receiver,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn state(&self) -> RequestState {
        self.lifecycle.state()
    }

    pub fn result(&self) -> Option<RequestResult> {
        self.lifecycle.result().copied()
    }

    /// Waits for the single terminal completion of this request.
    pub async fn wait(self) -> Completion {
        match self.receiver.await {
            Ok(completion) => completion,
            // The sender lives inside the request, whose Drop always sends;
            // reaching this arm means the runtime tore the request down.
            Err(_) => Completion {
                id: self.id,
                operation_code: 0,
                result: self
                    .lifecycle
                    .result()
                    .copied()
                    .unwrap_or_else(RequestResult::abandoned),
                output: OutputRegion::default(),
            },
        }
    }
}
