// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::region::{InputRegion, OutputRegion};
use crate::errors::{DispatchError, RegionKind};

/// Size of one validation code on the wire.
pub const OTP_CODE_SIZE: usize = std::mem::size_of::<u32>();
/// Size of one result code on the wire.
pub const RESULT_CODE_SIZE: usize = std::mem::size_of::<u32>();

/// Minimum region sizes an operation needs before any typed access.
///
/// # Example
/// ```
/// use otp_ioctl_core::buffers::{BufferContract, InputRegion, OutputRegion};
///
/// let input = InputRegion::new(123_456u32.to_le_bytes().to_vec());
/// let mut output = OutputRegion::with_capacity(4);
///
/// let mut checked = BufferContract::OTP_VALIDATION.check(&input, &mut output).unwrap();
/// assert_eq!(checked.input_u32_le().unwrap(), 123_456);
/// checked.write_output_u32_le(1).unwrap();
/// assert_eq!(output.as_slice(), &[1, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferContract {
    pub input_min: usize,
    pub output_min: usize,
}

impl BufferContract {
    /// One little-endian u32 code in, one u32 result out.
    pub const OTP_VALIDATION: BufferContract = BufferContract::new(OTP_CODE_SIZE, RESULT_CODE_SIZE);

    pub const fn new(input_min: usize, output_min: usize) -> Self {
        Self {
            input_min,
            output_min,
        }
    }

    /// Checks a single region length against its minimum.
    pub fn require(region: RegionKind, actual: usize, required: usize) -> Result<(), DispatchError> {
        if actual >= required {
            Ok(())
        } else {
            Err(DispatchError::BufferTooSmall {
                region,
                required,
                actual,
            })
        }
    }

    /// Checks input then output; the caller gets typed access only if both pass.
    pub fn check<'a>(
        &self,
        input: &'a InputRegion,
        output: &'a mut OutputRegion,
    ) -> Result<CheckedRegions<'a>, DispatchError> {
        Self::require(RegionKind::Input, input.len(), self.input_min)?;
        Self::require(RegionKind::Output, output.capacity(), self.output_min)?;
        Ok(CheckedRegions {
            input: input.as_slice(),
            output,
        })
    }
}

/// Regions that passed a [`BufferContract`].
#[derive(Debug)]
pub struct CheckedRegions<'a> {
    input: &'a [u8],
    output: &'a mut OutputRegion,
}

impl CheckedRegions<'_> {
    pub fn input(&self) -> &[u8] {
        self.input
    }

    /// Reads the leading little-endian u32 of the input region.
    pub fn input_u32_le(&self) -> Result<u32, DispatchError> {
        self.input
            .first_chunk::<OTP_CODE_SIZE>()
            .map(|raw| u32::from_le_bytes(*raw))
            .ok_or(DispatchError::BufferTooSmall {
                region: RegionKind::Input,
                required: OTP_CODE_SIZE,
                actual: self.input.len(),
            })
    }

    /// Writes `value` little-endian at the start of the output region.
    pub fn write_output_u32_le(&mut self, value: u32) -> Result<usize, DispatchError> {
        self.output.write(&value.to_le_bytes())
    }
}
