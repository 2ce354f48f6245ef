use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::buffers::{InputRegion, OutputRegion};
use crate::engine::RequestId;
use crate::errors::DispatchError;
use crate::policy::ValidationOutcome;

/// Everything a handler may touch while processing one request.
///
/// The regions are exclusively borrowed from the request for the duration of
/// the call; no other component can reach them concurrently.
pub struct RequestContext<'a> {
    pub id: RequestId,
    pub operation_code: u32,
    pub input: &'a InputRegion,
    pub output: &'a mut OutputRegion,
    /// Cancelled once the owning queue begins stopping. Handlers are never
    /// interrupted; long-running ones may poll this to finish early.
    pub stop: &'a CancellationToken,
}

/// Successful handler result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Handled {
    pub bytes_written: usize,
    pub validation: Option<ValidationOutcome>,
}

#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn process(&self, ctx: RequestContext<'_>) -> Result<Handled, DispatchError>;

    fn name(&self) -> &'static str;
}
