// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::buffers::BufferContract;
use crate::errors::DispatchError;
use crate::policy::ValidationOutcome;
use crate::traits::{Handled, OperationHandler, RequestContext, ValidationPolicy};

/// Result code written for an accepted code.
pub const OTP_ACCEPTED: u32 = 1;
/// Result code written for a rejected code.
pub const OTP_REJECTED: u32 = 0;

/// Handler for the "validate OTP" control code.
///
/// Input: one little-endian u32 code. Output: one little-endian u32,
/// [`OTP_ACCEPTED`] or [`OTP_REJECTED`]. Both regions are checked before the
/// input is read, so an undersized request fails with no side effects.
pub struct OtpValidationHandler {
    policy: Arc<dyn ValidationPolicy>,
}

impl OtpValidationHandler {
    pub fn new(policy: Arc<dyn ValidationPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

#[async_trait]
impl OperationHandler for OtpValidationHandler {
    async fn process(&self, ctx: RequestContext<'_>) -> Result<Handled, DispatchError> {
        let mut regions = BufferContract::OTP_VALIDATION.check(ctx.input, ctx.output)?;

        let outcome = ValidationOutcome::evaluate(self.policy.as_ref(), regions.input_u32_le()?);
        let result_code = if outcome.accepted { OTP_ACCEPTED } else { OTP_REJECTED };
        let bytes_written = regions.write_output_u32_le(result_code)?;

        Ok(Handled {
            bytes_written,
            validation: Some(outcome),
        })
    }

    fn name(&self) -> &'static str {
        "otp_validation"
    }
}
