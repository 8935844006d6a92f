use crate::error::{CodecError, CodecResult};
use crate::persistable::{Persistable, PersistableRegistry};
use crate::scalar;
use crate::value::flag;
use crate::writer::PROTOCOL_VERSION;

/// Field-by-field reader for persistable records: the exact mirror of
/// [`RecordWriter`](crate::RecordWriter).
///
/// Fields must be read in the order they were written. Every read
/// validates the field's type flag and bounds; a mismatch or truncation is
/// a typed error, never a silent default.
pub struct RecordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    /// Decode one persistable record: flag, version, then the registered
    /// type's field sequence.
    pub(crate) fn deserialize(
        key: &str,
        bytes: &'a [u8],
        registry: &PersistableRegistry,
    ) -> CodecResult<Box<dyn Persistable>> {
        let mut reader = Self { bytes, offset: 0 };
        reader.expect_flag(flag::PERSISTABLE)?;
        let version = reader.read_i32()?;
        if version != PROTOCOL_VERSION {
            return Err(CodecError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found: version,
            });
        }
        registry.decode(key, &mut reader)
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn expect_flag(&mut self, expected: i8) -> CodecResult<()> {
        if self.remaining() < 1 {
            return Err(CodecError::Truncated {
                needed: 1,
                remaining: 0,
            });
        }
        let found = self.bytes[self.offset] as i8;
        if found != expected {
            return Err(CodecError::FlagMismatch {
                expected,
                found,
                offset: self.offset,
            });
        }
        self.offset += 1;
        Ok(())
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::Truncated {
                needed: len - self.remaining(),
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        let v = scalar::decode_bool(self.bytes, self.offset)?;
        self.offset += scalar::BOOL_SIZE;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> CodecResult<i8> {
        let v = scalar::decode_i8(self.bytes, self.offset)?;
        self.offset += scalar::BYTE_SIZE;
        Ok(v)
    }

    pub fn read_i16(&mut self) -> CodecResult<i16> {
        let v = scalar::decode_i16(self.bytes, self.offset)?;
        self.offset += scalar::SHORT_SIZE;
        Ok(v)
    }

    pub fn read_char(&mut self) -> CodecResult<char> {
        let v = scalar::decode_char(self.bytes, self.offset)?;
        self.offset += scalar::CHAR_SIZE;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        let v = scalar::decode_i32(self.bytes, self.offset)?;
        self.offset += scalar::INT_SIZE;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        let v = scalar::decode_i64(self.bytes, self.offset)?;
        self.offset += scalar::LONG_SIZE;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        let v = scalar::decode_f32(self.bytes, self.offset)?;
        self.offset += scalar::FLOAT_SIZE;
        Ok(v)
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        let v = scalar::decode_f64(self.bytes, self.offset)?;
        self.offset += scalar::DOUBLE_SIZE;
        Ok(v)
    }

    /// Reads the length prefix, then the flagged UTF-8 payload. A length
    /// of `-1` is the null sentinel and yields `None`; `0` yields an empty
    /// string.
    pub fn read_string(&mut self) -> CodecResult<Option<String>> {
        match self.read_len()? {
            None => Ok(None),
            Some(len) => {
                self.expect_flag(flag::STRING)?;
                let payload = self.take(len)?;
                Ok(Some(String::from_utf8(payload.to_vec())?))
            }
        }
    }

    /// Reads the length prefix, then the flagged raw payload. A length of
    /// `-1` is the null sentinel and yields `None`; `0` yields an empty
    /// array.
    pub fn read_bytes(&mut self) -> CodecResult<Option<Vec<u8>>> {
        match self.read_len()? {
            None => Ok(None),
            Some(len) => {
                self.expect_flag(flag::BYTE_ARRAY)?;
                let payload = self.take(len)?;
                Ok(Some(payload.to_vec()))
            }
        }
    }

    fn read_len(&mut self) -> CodecResult<Option<usize>> {
        let len = self.read_i32()?;
        if len == -1 {
            return Ok(None);
        }
        if len < 0 {
            // Only -1 is a valid sentinel.
            return Err(CodecError::InvalidLength { length: len });
        }
        Ok(Some(len as usize))
    }
}
