// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::DispatchError;
use crate::traits::{Handled, OperationHandler, RequestContext};

/// Fallback for every unmapped control code. Never touches either region.
#[derive(Debug, Default)]
pub struct UnsupportedHandler;

#[async_trait]
impl OperationHandler for UnsupportedHandler {
    async fn process(&self, ctx: RequestContext<'_>) -> Result<Handled, DispatchError> {
        Err(DispatchError::UnsupportedOperation {
            code: ctx.operation_code,
        })
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}
