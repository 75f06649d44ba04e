//! Little-endian unsigned integer decoding for zip length and offset fields.

use super::{ZipError, ZipResult};
use byteorder::{ByteOrder, LittleEndian};

/// Decode a 2- or 4-byte little-endian unsigned integer.
///
/// Two or three bytes decode the first two as a `u16`; four or more decode the
/// first four as a `u32`. Fewer than two bytes is `InvalidLength`.
pub fn decode_uint(bytes: &[u8]) -> ZipResult<u32> {
    match bytes.len() {
        0 | 1 => Err(ZipError::InvalidLength(bytes.len())),
        2 | 3 => Ok(u32::from(LittleEndian::read_u16(&bytes[..2]))),
        _ => Ok(LittleEndian::read_u32(&bytes[..4])),
    }
}
