pub mod handle;
pub mod lifecycle;
pub mod queue;
pub mod request;
pub mod router;
#[cfg(test)]
pub mod integration_tests;

pub use handle::RequestHandle;
pub use lifecycle::{LifecycleCell, RequestResult, RequestState};
pub use queue::{DispatchOptions, DispatchQueue, DrainReport, StopAck};
pub use request::{Completion, Request, RequestId};
pub use router::ControlCodeRouter;
