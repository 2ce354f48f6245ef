use crate::observability::DispatchEvent;

/// Receiver for the structured events emitted by the dispatch core.
///
/// The core never formats or persists diagnostics itself; it hands each event
/// to the injected sink, which decides what to do with it.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &DispatchEvent);
}
