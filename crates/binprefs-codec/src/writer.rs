use crate::buffer::GrowableBuf;
use crate::error::{CodecError, CodecResult};
use crate::persistable::Persistable;
use crate::scalar;
use crate::value::flag;

/// Serialization protocol version written into every persistable record.
pub(crate) const PROTOCOL_VERSION: i32 = 1;

/// Lengths travel as signed 32-bit ints; a longer payload would wrap the
/// prefix and decode as silent truncation, so it is rejected up front.
pub(crate) fn field_len(len: usize) -> CodecResult<i32> {
    i32::try_from(len).map_err(|_| CodecError::LengthOverflow { len })
}

/// Field-by-field writer for persistable records.
///
/// Produces `[persistable flag][version int][fields...]`, trimmed to the
/// exact number of bytes written. Strings and byte arrays are
/// length-prefixed through the int encoding, with `-1` as the null
/// sentinel; the length counts payload bytes only, while the payload that
/// follows keeps its own serializer flag for parity with the scalar
/// encodings.
pub struct RecordWriter {
    buf: GrowableBuf,
}

impl RecordWriter {
    fn new() -> Self {
        Self {
            buf: GrowableBuf::new(),
        }
    }

    /// Serialize one persistable record to its on-disk byte string.
    pub(crate) fn serialize(value: &dyn Persistable) -> CodecResult<Vec<u8>> {
        let mut writer = Self::new();
        writer.buf.write(&[flag::PERSISTABLE as u8]);
        writer.write_i32(PROTOCOL_VERSION);
        value.write_to(&mut writer)?;
        Ok(writer.buf.into_trimmed())
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.write(&scalar::encode_bool(v));
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.write(&scalar::encode_i8(v));
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.write(&scalar::encode_i16(v));
    }

    /// Fails for chars above U+FFFF, which do not fit one UTF-16 code unit.
    pub fn write_char(&mut self, v: char) -> CodecResult<()> {
        self.buf.write(&scalar::encode_char(v)?);
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.write(&scalar::encode_i32(v));
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.write(&scalar::encode_i64(v));
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.write(&scalar::encode_f32(v));
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.write(&scalar::encode_f64(v));
    }

    /// `None` writes the `-1` sentinel and nothing else. Fails for
    /// payloads longer than the length prefix can represent.
    pub fn write_string(&mut self, v: Option<&str>) -> CodecResult<()> {
        match v {
            None => self.write_i32(-1),
            Some(s) => {
                self.write_i32(field_len(s.len())?);
                self.buf.write(&[flag::STRING as u8]);
                self.buf.write(s.as_bytes());
            }
        }
        Ok(())
    }

    /// `None` writes the `-1` sentinel and nothing else. Fails for
    /// payloads longer than the length prefix can represent.
    pub fn write_bytes(&mut self, v: Option<&[u8]>) -> CodecResult<()> {
        match v {
            None => self.write_i32(-1),
            Some(bytes) => {
                self.write_i32(field_len(bytes.len())?);
                self.buf.write(&[flag::BYTE_ARRAY as u8]);
                self.buf.write(bytes);
            }
        }
        Ok(())
    }
}
