pub mod handler;
pub mod policy;
pub mod sink;

pub use handler::{Handled, OperationHandler, RequestContext};
pub use policy::ValidationPolicy;
pub use sink::DiagnosticSink;
