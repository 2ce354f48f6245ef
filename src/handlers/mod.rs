// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod otp;
pub mod unsupported;

#[cfg(test)]
pub mod stub;

pub use otp::{OtpValidationHandler, OTP_ACCEPTED, OTP_REJECTED};
pub use unsupported::UnsupportedHandler;
