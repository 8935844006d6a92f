//! Fixed-width flagged encodings for the scalar value kinds.
//!
//! Every scalar is `[flag: 1 byte][big-endian payload]`. The encode side
//! produces the full flagged byte string; the decode side validates the
//! flag and bounds at an arbitrary offset so the record reader can walk a
//! field sequence with the same helpers the registry uses at offset zero.

use crate::error::{CodecError, CodecResult};
use crate::value::flag;

/// Total encoded size (flag included) per scalar kind.
pub(crate) const BOOL_SIZE: usize = 2;
pub(crate) const BYTE_SIZE: usize = 2;
pub(crate) const SHORT_SIZE: usize = 3;
pub(crate) const CHAR_SIZE: usize = 3;
pub(crate) const INT_SIZE: usize = 5;
pub(crate) const LONG_SIZE: usize = 9;
pub(crate) const FLOAT_SIZE: usize = 5;
pub(crate) const DOUBLE_SIZE: usize = 9;

pub(crate) fn encode_bool(v: bool) -> [u8; BOOL_SIZE] {
    [flag::BOOL as u8, v as u8]
}

pub(crate) fn encode_i8(v: i8) -> [u8; BYTE_SIZE] {
    [flag::BYTE as u8, v as u8]
}

pub(crate) fn encode_i16(v: i16) -> [u8; SHORT_SIZE] {
    let b = v.to_be_bytes();
    [flag::SHORT as u8, b[0], b[1]]
}

pub(crate) fn encode_char(v: char) -> CodecResult<[u8; CHAR_SIZE]> {
    let unit = u32::from(v);
    if unit > 0xFFFF {
        return Err(CodecError::CharOutOfRange { value: v });
    }
    let b = (unit as u16).to_be_bytes();
    Ok([flag::CHAR as u8, b[0], b[1]])
}

pub(crate) fn encode_i32(v: i32) -> [u8; INT_SIZE] {
    let b = v.to_be_bytes();
    [flag::INT as u8, b[0], b[1], b[2], b[3]]
}

pub(crate) fn encode_i64(v: i64) -> [u8; LONG_SIZE] {
    let b = v.to_be_bytes();
    [flag::LONG as u8, b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

pub(crate) fn encode_f32(v: f32) -> [u8; FLOAT_SIZE] {
    let b = v.to_bits().to_be_bytes();
    [flag::FLOAT as u8, b[0], b[1], b[2], b[3]]
}

pub(crate) fn encode_f64(v: f64) -> [u8; DOUBLE_SIZE] {
    let b = v.to_bits().to_be_bytes();
    [flag::DOUBLE as u8, b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Validate the flag byte at `offset` and return the payload that follows.
fn payload<'a>(
    bytes: &'a [u8],
    offset: usize,
    expected: i8,
    size: usize,
) -> CodecResult<&'a [u8]> {
    let remaining = bytes.len().saturating_sub(offset);
    if remaining < size {
        return Err(CodecError::Truncated {
            needed: size - remaining,
            remaining,
        });
    }
    let found = bytes[offset] as i8;
    if found != expected {
        return Err(CodecError::FlagMismatch {
            expected,
            found,
            offset,
        });
    }
    Ok(&bytes[offset + 1..offset + size])
}

pub(crate) fn decode_bool(bytes: &[u8], offset: usize) -> CodecResult<bool> {
    let p = payload(bytes, offset, flag::BOOL, BOOL_SIZE)?;
    Ok(p[0] != 0)
}

pub(crate) fn decode_i8(bytes: &[u8], offset: usize) -> CodecResult<i8> {
    let p = payload(bytes, offset, flag::BYTE, BYTE_SIZE)?;
    Ok(p[0] as i8)
}

pub(crate) fn decode_i16(bytes: &[u8], offset: usize) -> CodecResult<i16> {
    let p = payload(bytes, offset, flag::SHORT, SHORT_SIZE)?;
    Ok(i16::from_be_bytes([p[0], p[1]]))
}

pub(crate) fn decode_char(bytes: &[u8], offset: usize) -> CodecResult<char> {
    let p = payload(bytes, offset, flag::CHAR, CHAR_SIZE)?;
    let unit = u16::from_be_bytes([p[0], p[1]]);
    char::from_u32(u32::from(unit)).ok_or(CodecError::InvalidCharUnit { unit })
}

pub(crate) fn decode_i32(bytes: &[u8], offset: usize) -> CodecResult<i32> {
    let p = payload(bytes, offset, flag::INT, INT_SIZE)?;
    Ok(i32::from_be_bytes([p[0], p[1], p[2], p[3]]))
}

pub(crate) fn decode_i64(bytes: &[u8], offset: usize) -> CodecResult<i64> {
    let p = payload(bytes, offset, flag::LONG, LONG_SIZE)?;
    Ok(i64::from_be_bytes([
        p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7],
    ]))
}

pub(crate) fn decode_f32(bytes: &[u8], offset: usize) -> CodecResult<f32> {
    let p = payload(bytes, offset, flag::FLOAT, FLOAT_SIZE)?;
    Ok(f32::from_bits(u32::from_be_bytes([p[0], p[1], p[2], p[3]])))
}

pub(crate) fn decode_f64(bytes: &[u8], offset: usize) -> CodecResult<f64> {
    let p = payload(bytes, offset, flag::DOUBLE, DOUBLE_SIZE)?;
    Ok(f64::from_bits(u64::from_be_bytes([
        p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7],
    ])))
}
