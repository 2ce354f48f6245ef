/// Accept/reject decision for a submitted one-time code.
///
/// Implementations must be deterministic and free of side effects: the
/// dispatch core calls `validate` concurrently from every worker without any
/// synchronization.
pub trait ValidationPolicy: Send + Sync {
    fn validate(&self, code: u32) -> bool;

    fn name(&self) -> &'static str;
}
