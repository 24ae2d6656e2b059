use std::io::Write;

use byteorder::WriteBytesExt;
use num_traits::ToPrimitive;

use super::MessageEndian;

pub const NUL: u8 = 0;

/// Container and string lengths are always written as `u32`.
pub fn write_len(len: usize, dest: &mut impl Write) -> std::io::Result<()> {
    let Some(len) = len.to_u32() else {
        return Err(invalid_data("cannot cast `usize` to `u32`"));
    };
    dest.write_u32::<MessageEndian>(len)
}

pub fn invalid_data(m: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, m)
}
