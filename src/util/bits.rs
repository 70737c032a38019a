//! Big-endian bit packing
//!
//! FLV and the codec records it carries pack most fields MSB-first, either as
//! whole big-endian integers of 1..=4 bytes or as bit fields that cross byte
//! boundaries (the AudioSpecificConfig sampling index spans bytes 0 and 1).
//!
//! ```text
//! byte 0           byte 1
//! 7 6 5 4 3 2 1 0  7 6 5 4 3 2 1 0
//! [ object type ][ freq  ][ chan  ]...
//! ```

use crate::error::DemuxError;

/// Pack up to 4 big-endian bytes into one unsigned integer.
///
/// `combine_bits(&[a, b, c])` is `(a << 16) | (b << 8) | c`.
/// An empty slice yields 0.
pub fn combine_bits(bytes: &[u8]) -> u32 {
    debug_assert!(bytes.len() <= 4);
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Sign-extend the low 24 bits of `value`
pub fn sign_extend_24(value: u32) -> i32 {
    ((value << 8) as i32) >> 8
}

/// MSB-first bit cursor over a byte slice
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Bits left to read
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Current position in bits from the start of the slice
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Read `count` bits (at most 32) as an unsigned big-endian value
    pub fn read_bits(&mut self, count: usize) -> Result<u32, DemuxError> {
        debug_assert!(count <= 32);
        if count > self.remaining() {
            return Err(DemuxError::TruncatedRecord("bit field"));
        }

        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.data[self.bit_pos / 8];
            let bit = (byte >> (7 - (self.bit_pos % 8))) & 0x01;
            value = (value << 1) | bit as u32;
            self.bit_pos += 1;
        }
        Ok(value)
    }

    /// Read a bit field that fits in a byte
    pub fn read_u8(&mut self, count: usize) -> Result<u8, DemuxError> {
        debug_assert!(count <= 8);
        Ok(self.read_bits(count)? as u8)
    }

    pub fn read_flag(&mut self) -> Result<bool, DemuxError> {
        Ok(self.read_bits(1)? == 1)
    }
}
