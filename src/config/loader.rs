// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::IOCTL_USBOTP_VALIDATE_OTP;
use crate::engine::DispatchOptions;
use crate::errors::ConfigError;
use crate::policy::DEFAULT_STATIC_CODE;

/// Configuration for one OTP dispatch core.
///
/// Every section is optional. An empty file yields the standard control code,
/// one worker per core, an unbounded drain and the fail-closed policy.
///
/// # Example
/// ```yaml
/// operation_code: 0x9C412400
/// dispatch:
///   workers: 4
///   drain_timeout_ms: 5000
/// policy:
///   type: static_code
///   code: 123456
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Control code routed to OTP validation. Defaults to
    /// [`IOCTL_USBOTP_VALIDATE_OTP`].
    pub operation_code: Option<u32>,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Config {
    pub fn operation_code(&self) -> u32 {
        self.operation_code.unwrap_or(IOCTL_USBOTP_VALIDATE_OTP)
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    pub workers: Option<usize>,
    /// Absent means `stop` waits for in-flight work indefinitely.
    pub drain_timeout_ms: Option<u64>,
}

impl DispatchConfig {
    pub fn to_options(&self) -> DispatchOptions {
        let options = match self.workers {
            Some(workers) => DispatchOptions::new(workers),
            None => DispatchOptions::default(),
        };
        match self.drain_timeout_ms {
            Some(ms) => options.with_drain_timeout(Duration::from_millis(ms)),
            None => options,
        }
    }
}

/// Which validation policy the OTP handler consults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Accept exactly one shared code.
    StaticCode {
        #[serde(default = "default_static_code")]
        code: u32,
    },
    #[default]
    RejectAll,
}

fn default_static_code() -> u32 {
    DEFAULT_STATIC_CODE
}

/// On-disk syntax of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

pub fn parse_config(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    match format {
        // serde_yaml rejects an empty document; treat it as all defaults.
        ConfigFormat::Yaml if content.trim().is_empty() => Ok(Config::default()),
        ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
        ConfigFormat::Toml => Ok(toml::from_str(content)?),
    }
}

/// Load a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format)
}

/// Load a config and reject values the dispatch core cannot run with.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
