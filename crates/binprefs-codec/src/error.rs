/// Errors from encoding or decoding preference records.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A record's byte content was empty.
    #[error("value for key '{key}' is zero bytes")]
    ZeroBytes { key: String },

    /// The leading type flag did not match any known value kind.
    #[error("unknown type flag {flag}")]
    UnknownFlag { flag: i8 },

    /// A field's type flag did not match the one the reader expected.
    #[error("type flag mismatch at offset {offset}: expected {expected}, found {found}")]
    FlagMismatch {
        expected: i8,
        found: i8,
        offset: usize,
    },

    /// A persistable record carried an unsupported protocol version.
    #[error("protocol version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },

    /// The input ended before a complete field could be read.
    #[error("truncated record: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// A length prefix was negative but not the `-1` null sentinel.
    #[error("invalid length prefix {length}")]
    InvalidLength { length: i32 },

    /// A payload too long for the signed 32-bit length prefix.
    #[error("payload of {len} bytes exceeds the 32-bit length limit")]
    LengthOverflow { len: usize },

    /// A persistable record was read for a key with no registered decoder.
    #[error("no persistable type registered for key '{key}'")]
    UnregisteredPersistable { key: String },

    /// A char above U+FFFF cannot be represented as one UTF-16 code unit.
    #[error("char {value:?} is outside the basic multilingual plane")]
    CharOutOfRange { value: char },

    /// A decoded UTF-16 code unit is a lone surrogate, not a char.
    #[error("code unit {unit:#06x} is not a valid char")]
    InvalidCharUnit { unit: u16 },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string payload: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
