// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod dispatch;
mod status;

pub use config::ConfigError;
pub use dispatch::{DispatchError, ErrorKind, LifecycleError, RegionKind};
pub use status::Status;
