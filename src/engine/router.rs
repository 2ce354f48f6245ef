// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Control-code routing.
//!
//! The router is a static lookup table built once at startup and shared
//! read-only by every worker. Unmapped codes resolve to
//! [`UnsupportedHandler`], which fails the request without touching either
//! region.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::consts::IOCTL_USBOTP_VALIDATE_OTP;
use crate::handlers::{OtpValidationHandler, UnsupportedHandler};
use crate::traits::{OperationHandler, ValidationPolicy};

pub struct ControlCodeRouter {
    routes: HashMap<u32, Arc<dyn OperationHandler>>,
    unsupported: Arc<dyn OperationHandler>,
}

impl ControlCodeRouter {
    /// Router with no mapped codes; every request is unsupported.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            unsupported: Arc::new(UnsupportedHandler),
        }
    }

    /// Router mapping `operation_code` to OTP validation under `policy`.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use otp_ioctl_core::config::consts::IOCTL_USBOTP_VALIDATE_OTP;
    /// use otp_ioctl_core::engine::ControlCodeRouter;
    /// use otp_ioctl_core::policy::StaticCodePolicy;
    ///
    /// let router = ControlCodeRouter::otp(IOCTL_USBOTP_VALIDATE_OTP, Arc::new(StaticCodePolicy::default()));
    /// assert_eq!(router.route(IOCTL_USBOTP_VALIDATE_OTP).name(), "otp_validation");
    /// assert_eq!(router.route(0xFFFF).name(), "unsupported");
    /// ```
    pub fn otp(operation_code: u32, policy: Arc<dyn ValidationPolicy>) -> Self {
        Self::new().with_route(operation_code, Arc::new(OtpValidationHandler::new(policy)))
    }

    /// Maps `code` to `handler`, replacing any previous mapping.
    pub fn with_route(mut self, code: u32, handler: Arc<dyn OperationHandler>) -> Self {
        self.routes.insert(code, handler);
        self
    }

    pub fn route(&self, code: u32) -> &Arc<dyn OperationHandler> {
        self.routes.get(&code).unwrap_or(&self.unsupported)
    }

    pub fn is_supported(&self, code: u32) -> bool {
        self.routes.contains_key(&code)
    }

    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.routes.keys().copied()
    }
}

impl Default for ControlCodeRouter {
    /// OTP validation on the standard control code with the fail-closed policy.
    fn default() -> Self {
        Self::otp(
            IOCTL_USBOTP_VALIDATE_OTP,
            Arc::new(crate::policy::RejectAllPolicy),
        )
    }
}

impl fmt::Debug for ControlCodeRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<_> = self
            .routes
            .iter()
            .map(|(code, handler)| (format!("0x{:08X}", code), handler.name()))
            .collect();
        routes.sort();
        f.debug_struct("ControlCodeRouter")
            .field("routes", &routes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{InputRegion, OutputRegion};
    use crate::engine::RequestId;
    use crate::errors::DispatchError;
    use crate::policy::StaticCodePolicy;
    use crate::traits::RequestContext;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_only_mapped_code_is_supported() {
        let router = ControlCodeRouter::otp(0x9C41_2400, Arc::new(StaticCodePolicy::default()));
        assert!(router.is_supported(0x9C41_2400));
        assert!(!router.is_supported(0xFFFF));
        assert_eq!(router.codes().collect::<Vec<_>>(), vec![0x9C41_2400]);
    }

    #[test]
    fn test_default_uses_standard_code() {
        let router = ControlCodeRouter::default();
        assert!(router.is_supported(IOCTL_USBOTP_VALIDATE_OTP));
        assert_eq!(
            format!("{:?}", router),
            "ControlCodeRouter { routes: [(\"0x9C412400\", \"otp_validation\")] }"
        );
    }

    #[tokio::test]
    async fn test_unsupported_leaves_regions_untouched() {
        let router = ControlCodeRouter::new();
        let input = InputRegion::new(vec![]);
        let mut output = OutputRegion::new(vec![0x11; 4]);
        let stop = CancellationToken::new();

        let err = router
            .route(0xFFFF)
            .process(RequestContext {
                id: RequestId(9),
                operation_code: 0xFFFF,
                input: &input,
                output: &mut output,
                stop: &stop,
            })
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::UnsupportedOperation { code: 0xFFFF });
        assert_eq!(output.as_slice(), &[0x11; 4]);
        assert_eq!(output.write_count(), 0);
    }
}
