use std::collections::HashSet;

use crate::persistable::Persistable;

/// Type flags identifying each value kind on the wire.
///
/// The flag is the first byte of every serialized record. The numbering is
/// fixed by previously persisted data and must never change.
pub(crate) mod flag {
    pub const STRING_SET: i8 = -1;
    pub const STRING: i8 = -2;
    pub const INT: i8 = -3;
    pub const LONG: i8 = -4;
    pub const DOUBLE: i8 = -5;
    pub const FLOAT: i8 = -6;
    pub const BOOL: i8 = -7;
    pub const BYTE: i8 = -8;
    pub const SHORT: i8 = -9;
    pub const CHAR: i8 = -10;
    pub const PERSISTABLE: i8 = -11;
    pub const BYTE_ARRAY: i8 = -12;
}

/// One preference value: the closed set of kinds the wire format supports.
///
/// Scalars are fixed-width on disk; strings, byte arrays, and string sets
/// are variable-length; structured records go through the [`Persistable`]
/// trait and the record writer/reader.
#[derive(Debug)]
pub enum PrefValue {
    Bool(bool),
    Byte(i8),
    Bytes(Vec<u8>),
    Short(i16),
    /// One UTF-16 code unit on the wire. Chars above U+FFFF are rejected
    /// at encode time.
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    StringSet(HashSet<String>),
    Persistable(Box<dyn Persistable>),
}

impl PrefValue {
    /// Human-readable kind name (for logs and errors).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Byte(_) => "byte",
            Self::Bytes(_) => "byte array",
            Self::Short(_) => "short",
            Self::Char(_) => "char",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::StringSet(_) => "string set",
            Self::Persistable(_) => "persistable",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Self::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Self::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_set(&self) -> Option<&HashSet<String>> {
        match self {
            Self::StringSet(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_persistable(&self) -> Option<&dyn Persistable> {
        match self {
            Self::Persistable(v) => Some(v.as_ref()),
            _ => None,
        }
    }
}

impl Clone for PrefValue {
    fn clone(&self) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(*v),
            Self::Byte(v) => Self::Byte(*v),
            Self::Bytes(v) => Self::Bytes(v.clone()),
            Self::Short(v) => Self::Short(*v),
            Self::Char(v) => Self::Char(*v),
            Self::Int(v) => Self::Int(*v),
            Self::Long(v) => Self::Long(*v),
            Self::Float(v) => Self::Float(*v),
            Self::Double(v) => Self::Double(*v),
            Self::String(v) => Self::String(v.clone()),
            Self::StringSet(v) => Self::StringSet(v.clone()),
            // A structured record clones through its own deep-copy hook so
            // the copy shares no mutable state with the original.
            Self::Persistable(v) => Self::Persistable(v.deep_clone()),
        }
    }
}

impl PartialEq for PrefValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::StringSet(a), Self::StringSet(b)) => a == b,
            (Self::Persistable(a), Self::Persistable(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

impl From<bool> for PrefValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for PrefValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for PrefValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<char> for PrefValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<i32> for PrefValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for PrefValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for PrefValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for PrefValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for PrefValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PrefValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<u8>> for PrefValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<HashSet<String>> for PrefValue {
    fn from(v: HashSet<String>) -> Self {
        Self::StringSet(v)
    }
}

impl From<Box<dyn Persistable>> for PrefValue {
    fn from(v: Box<dyn Persistable>) -> Self {
        Self::Persistable(v)
    }
}
