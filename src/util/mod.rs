//! Byte and bit level helpers shared by the tag decoders

pub mod bits;
pub mod reader;

pub use bits::{combine_bits, BitReader};
pub use reader::BufferReader;
