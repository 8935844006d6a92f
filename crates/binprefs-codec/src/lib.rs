//! Binary wire format for the binprefs preference store.
//!
//! Every persisted record is a flagged byte string: one signed type-flag
//! byte followed by a type-specific payload. The flag numbering and byte
//! layouts are fixed by previously persisted data and are the crate's only
//! bit-exact contract.
//!
//! # Value kinds
//!
//! - fixed-width scalars: bool, byte, short, char, int, long, float,
//!   double (big-endian, IEEE-754 bit patterns for floats)
//! - variable-length: string (UTF-8), byte array, string set
//! - structured records: any type implementing [`Persistable`], framed
//!   with the persistable flag and a protocol version, fields written
//!   through [`RecordWriter`] and read back through [`RecordReader`]
//!
//! # Null sentinel
//!
//! String and byte-array fields inside persistable records are
//! length-prefixed; a length of `-1` means "absent" and maps to `None` at
//! this crate's boundary. A length of `0` is an empty (present) value.
//!
//! # Design rules
//!
//! 1. Decoding is the exact mirror of encoding and fails loudly on flag,
//!    version, or bounds violations - never a silent default.
//! 2. Buffer growth during encoding is a capacity concern only; output
//!    bytes are identical regardless of growth steps.
//! 3. Values leaving a cache pass through
//!    [`SerializerRegistry::redefine_mutable`] so callers can never
//!    mutate cached state through a returned reference.

pub mod error;
pub mod persistable;
pub mod reader;
pub mod registry;
pub mod value;
pub mod writer;

mod buffer;
mod scalar;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{CodecError, CodecResult};
pub use persistable::{Persistable, PersistableRead, PersistableRegistry};
pub use reader::RecordReader;
pub use registry::SerializerRegistry;
pub use value::PrefValue;
pub use writer::RecordWriter;
