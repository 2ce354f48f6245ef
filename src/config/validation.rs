//! Semantic checks on a parsed [`Config`].
//!
//! Parsing only guarantees the shape of the file. These checks reject values
//! that parse fine but cannot drive a dispatch queue. Every problem is
//! reported, not just the first.

use crate::config::Config;

/// Validates a configuration, returning one message per problem found.
///
/// # Example
/// ```
/// use otp_ioctl_core::config::{validate_config, Config, DispatchConfig};
///
/// let config = Config {
///     operation_code: Some(0),
///     dispatch: DispatchConfig { workers: Some(0), drain_timeout_ms: None },
///     ..Config::default()
/// };
/// assert_eq!(validate_config(&config).unwrap_err().len(), 2);
/// ```
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.operation_code == Some(0) {
        errors.push("operation_code: 0 is reserved and cannot be routed".to_string());
    }
    if config.dispatch.workers == Some(0) {
        errors.push("dispatch.workers: must be at least 1".to_string());
    }
    if config.dispatch.drain_timeout_ms == Some(0) {
        errors.push(
            "dispatch.drain_timeout_ms: must be greater than 0; omit it to wait indefinitely"
                .to_string(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchConfig, PolicyConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let config = Config {
            operation_code: Some(0),
            dispatch: DispatchConfig {
                workers: Some(0),
                drain_timeout_ms: Some(0),
            },
            policy: PolicyConfig::RejectAll,
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("operation_code"));
        assert!(errors[1].starts_with("dispatch.workers"));
        assert!(errors[2].starts_with("dispatch.drain_timeout_ms"));
    }

    #[test]
    fn test_explicit_values_pass() {
        let config = Config {
            operation_code: Some(0x0022_2000),
            dispatch: DispatchConfig {
                workers: Some(1),
                drain_timeout_ms: Some(1),
            },
            policy: PolicyConfig::StaticCode { code: 0 },
        };
        assert!(validate_config(&config).is_ok());
    }
}
