// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::{validate_config, Config, PolicyConfig};
use crate::engine::{ControlCodeRouter, DispatchQueue};
use crate::errors::ConfigError;
use crate::policy::{RejectAllPolicy, StaticCodePolicy};
use crate::traits::{DiagnosticSink, ValidationPolicy};

/// Dispatch runtime builder - turns a [`Config`] into a running queue.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use otp_ioctl_core::config::{Config, PolicyConfig, RuntimeBuilder};
/// use otp_ioctl_core::observability::TracingSink;
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = Config {
///     policy: PolicyConfig::StaticCode { code: 123_456 },
///     ..Config::default()
/// };
/// let queue = RuntimeBuilder::from_config(&config, Arc::new(TracingSink)).unwrap();
/// assert!(queue.router().is_supported(config.operation_code()));
/// queue.stop().await;
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Policy selected by the config.
    pub fn policy(cfg: &PolicyConfig) -> Arc<dyn ValidationPolicy> {
        match cfg {
            PolicyConfig::StaticCode { code } => Arc::new(StaticCodePolicy::new(*code)),
            PolicyConfig::RejectAll => Arc::new(RejectAllPolicy),
        }
    }

    /// Router with the configured code mapped to OTP validation.
    pub fn router(cfg: &Config) -> ControlCodeRouter {
        ControlCodeRouter::otp(cfg.operation_code(), Self::policy(&cfg.policy))
    }

    /// Validates `cfg` and starts a dispatch queue on the current tokio runtime.
    pub fn from_config(
        cfg: &Config,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<DispatchQueue, ConfigError> {
        validate_config(cfg).map_err(ConfigError::Invalid)?;
        Ok(DispatchQueue::start(
            Self::router(cfg),
            sink,
            cfg.dispatch.to_options(),
        ))
    }
}
