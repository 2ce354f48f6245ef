// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Caller-supplied byte regions and the contract that guards typed access to them.
//!
//! A request carries one read-only [`InputRegion`] and one fixed-capacity
//! [`OutputRegion`]. Handlers never touch either directly: they first run a
//! [`BufferContract`] which checks both minimum sizes in one step and only then
//! hands out a [`CheckedRegions`] view with typed accessors. If either check
//! fails, nothing has been read or written.

mod contract;
mod region;

pub use contract::{BufferContract, CheckedRegions, OTP_CODE_SIZE, RESULT_CODE_SIZE};
pub use region::{InputRegion, OutputRegion};
