// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use subtle::ConstantTimeEq;

use crate::traits::ValidationPolicy;

/// Reference code accepted when no other secret is configured.
pub const DEFAULT_STATIC_CODE: u32 = 123_456;

/// Accepts exactly one shared-secret code.
///
/// The comparison runs in constant time so response timing does not leak how
/// many leading bytes of a guess were correct.
///
/// # Example
/// ```
/// use otp_ioctl_core::policy::StaticCodePolicy;
/// use otp_ioctl_core::traits::ValidationPolicy;
///
/// let policy = StaticCodePolicy::new(123_456);
/// assert!(policy.validate(123_456));
/// assert!(!policy.validate(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCodePolicy {
    expected: u32,
}

impl StaticCodePolicy {
    pub fn new(expected: u32) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }
}

impl Default for StaticCodePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STATIC_CODE)
    }
}

impl ValidationPolicy for StaticCodePolicy {
    fn validate(&self, code: u32) -> bool {
        bool::from(code.ct_eq(&self.expected))
    }

    fn name(&self) -> &'static str {
        "static_code"
    }
}
