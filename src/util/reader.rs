//! Sequential, bounds-checked reads from a fixed buffer

use crate::error::DemuxError;

use super::bits::combine_bits;

/// Cursor over a borrowed byte slice.
///
/// Every read either returns the requested bytes or fails with
/// `TruncatedRecord` naming the field, leaving the cursor where it was.
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether the cursor sits exactly at the end of the buffer
    pub fn is_end(&self) -> bool {
        self.offset == self.data.len()
    }

    /// Take the next `len` bytes
    pub fn read(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], DemuxError> {
        if len > self.remaining() {
            return Err(DemuxError::TruncatedRecord(field));
        }
        let out = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DemuxError> {
        Ok(self.read(1, field)?[0])
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, DemuxError> {
        Ok(combine_bits(self.read(2, field)?) as u16)
    }

    /// Read a big-endian unsigned integer of `width` bytes (1..=4)
    pub fn read_uint(&mut self, width: usize, field: &'static str) -> Result<u32, DemuxError> {
        debug_assert!((1..=4).contains(&width));
        Ok(combine_bits(self.read(width, field)?))
    }

    /// Everything after the cursor, consuming it
    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.offset..];
        self.offset = self.data.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_reads() {
        let data = [0x01, 0x00, 0x05, 0xAA, 0xBB, 0xCC, 0xDD];
        let mut r = BufferReader::new(&data);

        assert_eq!(r.read_u8("version").unwrap(), 1);
        assert_eq!(r.read_u16("size").unwrap(), 5);
        assert_eq!(r.read(2, "body").unwrap(), &[0xAA, 0xBB]);
        assert_eq!(r.offset(), 5);
        assert_eq!(r.remaining(), 2);
        assert!(!r.is_end());
        assert_eq!(r.read_uint(2, "tail").unwrap(), 0xCCDD);
        assert!(r.is_end());
    }

    #[test]
    fn test_read_past_end_fails_without_advancing() {
        let data = [0x00, 0x00, 0x0A, 0x01];
        let mut r = BufferReader::new(&data);

        assert_eq!(r.read_uint(3, "length").unwrap(), 10);
        assert_eq!(
            r.read(10, "NALU"),
            Err(DemuxError::TruncatedRecord("NALU"))
        );
        assert_eq!(r.offset(), 3);
        assert_eq!(r.read_rest(), &[0x01]);
        assert!(r.is_end());
        assert!(r.read_u8("extra").is_err());
    }

    #[test]
    fn test_empty_buffer() {
        let mut r = BufferReader::new(&[]);
        assert!(r.is_end());
        assert_eq!(r.read(0, "nothing").unwrap(), &[] as &[u8]);
        assert!(r.read_u16("size").is_err());
    }
}
