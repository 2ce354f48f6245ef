// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation policies for submitted one-time codes.
//!
//! The dispatch core only knows the [`ValidationPolicy`] capability. Concrete
//! policies are injected at startup (see `RuntimeBuilder`) so they can be
//! swapped per deployment or mocked in tests.
//!
//! Shipped policies:
//! * [`StaticCodePolicy`] - shared-secret comparison against one configured code
//! * [`RejectAllPolicy`] - fail-closed policy for unprovisioned devices
//! * [`FnPolicy`] - adapter for closures

mod static_code;

pub use static_code::{StaticCodePolicy, DEFAULT_STATIC_CODE};

use serde::Serialize;
use std::fmt;

use crate::traits::ValidationPolicy;

/// Transient result of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub code: u32,
    pub accepted: bool,
}

impl ValidationOutcome {
    pub fn evaluate(policy: &dyn ValidationPolicy, code: u32) -> Self {
        Self {
            code,
            accepted: policy.validate(code),
        }
    }
}

/// Rejects every code.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllPolicy;

impl ValidationPolicy for RejectAllPolicy {
    fn validate(&self, _code: u32) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "reject_all"
    }
}

/// Wraps a closure as a [`ValidationPolicy`].
///
/// # Example
/// ```
/// use otp_ioctl_core::policy::FnPolicy;
/// use otp_ioctl_core::traits::ValidationPolicy;
///
/// let even_only = FnPolicy::new("even_only", |code| code % 2 == 0);
/// assert!(even_only.validate(42));
/// assert!(!even_only.validate(7));
/// ```
pub struct FnPolicy<F> {
    name: &'static str,
    check: F,
}

impl<F> FnPolicy<F>
where
    F: Fn(u32) -> bool + Send + Sync,
{
    pub fn new(name: &'static str, check: F) -> Self {
        Self { name, check }
    }
}

impl<F> ValidationPolicy for FnPolicy<F>
where
    F: Fn(u32) -> bool + Send + Sync,
{
    fn validate(&self, code: u32) -> bool {
        (self.check)(code)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<F> fmt::Debug for FnPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPolicy").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_all() {
        let policy = RejectAllPolicy;
        assert!(!policy.validate(0));
        assert!(!policy.validate(DEFAULT_STATIC_CODE));
        assert!(!policy.validate(u32::MAX));
    }

    #[test]
    fn test_evaluate_records_code() {
        let policy = FnPolicy::new("odd", |code| code % 2 == 1);
        assert_eq!(
            ValidationOutcome::evaluate(&policy, 3),
            ValidationOutcome { code: 3, accepted: true }
        );
        assert_eq!(
            ValidationOutcome::evaluate(&policy, 4),
            ValidationOutcome { code: 4, accepted: false }
        );
    }

    #[test]
    fn test_fn_policy_debug_shows_name() {
        let policy = FnPolicy::new("custom", |_| true);
        assert_eq!(format!("{:?}", policy), "FnPolicy { name: \"custom\" }");
    }
}
