// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod buffers;       // region types + size contract
pub mod config;        // config loading + runtime builder
pub mod engine;        // lifecycle, router, dispatch queue
pub mod errors;        // error handling
pub mod handlers;      // per-operation handlers
pub mod observability;
pub mod policy;        // OTP validation policies
pub mod traits;        // seams: handler, policy, sink
