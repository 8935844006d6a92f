use std::collections::HashSet;

use crate::error::{CodecError, CodecResult};
use crate::persistable::PersistableRegistry;
use crate::reader::RecordReader;
use crate::scalar;
use crate::value::{flag, PrefValue};
use crate::writer::RecordWriter;

/// Serialization front door: one `serialize`/`deserialize` pair covering
/// every value kind, dispatching on the leading type flag.
///
/// Holds the [`PersistableRegistry`] so structured records can be decoded
/// by preference key. `redefine_mutable` is the defensive-copy step every
/// value passes through before leaving the store's cache.
#[derive(Clone, Debug, Default)]
pub struct SerializerRegistry {
    persistables: PersistableRegistry,
}

impl SerializerRegistry {
    pub fn new(persistables: PersistableRegistry) -> Self {
        Self { persistables }
    }

    pub fn persistables(&self) -> &PersistableRegistry {
        &self.persistables
    }

    /// Encode one value to its on-disk byte string.
    pub fn serialize(&self, value: &PrefValue) -> CodecResult<Vec<u8>> {
        match value {
            PrefValue::Bool(v) => Ok(scalar::encode_bool(*v).to_vec()),
            PrefValue::Byte(v) => Ok(scalar::encode_i8(*v).to_vec()),
            PrefValue::Short(v) => Ok(scalar::encode_i16(*v).to_vec()),
            PrefValue::Char(v) => Ok(scalar::encode_char(*v)?.to_vec()),
            PrefValue::Int(v) => Ok(scalar::encode_i32(*v).to_vec()),
            PrefValue::Long(v) => Ok(scalar::encode_i64(*v).to_vec()),
            PrefValue::Float(v) => Ok(scalar::encode_f32(*v).to_vec()),
            PrefValue::Double(v) => Ok(scalar::encode_f64(*v).to_vec()),
            PrefValue::String(v) => {
                let mut bytes = Vec::with_capacity(1 + v.len());
                bytes.push(flag::STRING as u8);
                bytes.extend_from_slice(v.as_bytes());
                Ok(bytes)
            }
            PrefValue::Bytes(v) => {
                let mut bytes = Vec::with_capacity(1 + v.len());
                bytes.push(flag::BYTE_ARRAY as u8);
                bytes.extend_from_slice(v);
                Ok(bytes)
            }
            PrefValue::StringSet(v) => encode_string_set(v),
            PrefValue::Persistable(v) => RecordWriter::serialize(v.as_ref()),
        }
    }

    /// Decode one record's byte string, dispatching on the first byte.
    ///
    /// `key` selects the registered type for persistable records and
    /// names the record in errors.
    pub fn deserialize(&self, key: &str, bytes: &[u8]) -> CodecResult<PrefValue> {
        if bytes.is_empty() {
            return Err(CodecError::ZeroBytes {
                key: key.to_owned(),
            });
        }
        let type_flag = bytes[0] as i8;
        match type_flag {
            flag::BOOL => Ok(PrefValue::Bool(scalar::decode_bool(bytes, 0)?)),
            flag::BYTE => Ok(PrefValue::Byte(scalar::decode_i8(bytes, 0)?)),
            flag::SHORT => Ok(PrefValue::Short(scalar::decode_i16(bytes, 0)?)),
            flag::CHAR => Ok(PrefValue::Char(scalar::decode_char(bytes, 0)?)),
            flag::INT => Ok(PrefValue::Int(scalar::decode_i32(bytes, 0)?)),
            flag::LONG => Ok(PrefValue::Long(scalar::decode_i64(bytes, 0)?)),
            flag::FLOAT => Ok(PrefValue::Float(scalar::decode_f32(bytes, 0)?)),
            flag::DOUBLE => Ok(PrefValue::Double(scalar::decode_f64(bytes, 0)?)),
            flag::STRING => Ok(PrefValue::String(String::from_utf8(bytes[1..].to_vec())?)),
            flag::BYTE_ARRAY => Ok(PrefValue::Bytes(bytes[1..].to_vec())),
            flag::STRING_SET => Ok(PrefValue::StringSet(decode_string_set(bytes)?)),
            flag::PERSISTABLE => Ok(PrefValue::Persistable(RecordReader::deserialize(
                key,
                bytes,
                &self.persistables,
            )?)),
            other => Err(CodecError::UnknownFlag { flag: other }),
        }
    }

    /// Return a copy of `value` that is safe to hand to a caller without
    /// aliasing cached state: deep copy for structured records, plain
    /// clone for everything else.
    pub fn redefine_mutable(&self, value: &PrefValue) -> PrefValue {
        match value {
            PrefValue::Persistable(v) => PrefValue::Persistable(v.deep_clone()),
            other => other.clone(),
        }
    }
}

/// `[flag]` then, per element, a raw big-endian u32 byte length followed
/// by the UTF-8 bytes. Element lengths are unflagged, unlike the
/// length-prefixed fields inside persistable records, but share the same
/// signed 32-bit bound.
fn encode_string_set(set: &HashSet<String>) -> CodecResult<Vec<u8>> {
    let total: usize = set.iter().map(|s| 4 + s.len()).sum();
    let mut bytes = Vec::with_capacity(1 + total);
    bytes.push(flag::STRING_SET as u8);
    for s in set {
        let len = crate::writer::field_len(s.len())?;
        bytes.extend_from_slice(&(len as u32).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
    }
    Ok(bytes)
}

fn decode_string_set(bytes: &[u8]) -> CodecResult<HashSet<String>> {
    let mut set = HashSet::new();
    let mut offset = 1;
    while offset < bytes.len() {
        let remaining = bytes.len() - offset;
        if remaining < 4 {
            return Err(CodecError::Truncated {
                needed: 4 - remaining,
                remaining,
            });
        }
        let len = u32::from_be_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]) as usize;
        offset += 4;
        if bytes.len() - offset < len {
            return Err(CodecError::Truncated {
                needed: len - (bytes.len() - offset),
                remaining: bytes.len() - offset,
            });
        }
        set.insert(String::from_utf8(bytes[offset..offset + len].to_vec())?);
        offset += len;
    }
    Ok(set)
}
