// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{DispatchError, RegionKind};

/// Read-only bytes supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRegion {
    bytes: Vec<u8>,
}

impl InputRegion {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for InputRegion {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for InputRegion {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

/// Writable bytes supplied by the caller.
///
/// Capacity is fixed at submission; writes never grow the region. The region
/// counts how many writes it received so the single-write guarantee of the
/// completion path can be checked from the outside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRegion {
    bytes: Vec<u8>,
    written: usize,
    write_count: u32,
}

impl OutputRegion {
    /// Output region backed by `bytes`; its length is the capacity.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            written: 0,
            write_count: 0,
        }
    }

    /// Zero-filled output region of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(vec![0; capacity])
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Number of bytes written by the most recent write.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn write_count(&self) -> u32 {
        self.write_count
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Copies `data` to the start of the region.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, DispatchError> {
        let actual = self.bytes.len();
        let target = self
            .bytes
            .get_mut(..data.len())
            .ok_or(DispatchError::BufferTooSmall {
                region: RegionKind::Output,
                required: data.len(),
                actual,
            })?;
        target.copy_from_slice(data);
        self.written = data.len();
        self.write_count += 1;
        Ok(data.len())
    }
}

impl From<Vec<u8>> for OutputRegion {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
