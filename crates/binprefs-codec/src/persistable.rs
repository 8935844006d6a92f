use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CodecError, CodecResult};
use crate::reader::RecordReader;
use crate::writer::RecordWriter;

/// A structured record with full control over its own field layout.
///
/// Implementations write their fields through [`RecordWriter`] and read
/// them back in the same order through [`RecordReader`]. The store never
/// interprets the field sequence; it only frames it with the persistable
/// flag and protocol version.
pub trait Persistable: fmt::Debug + Send + Sync + 'static {
    /// Write all fields, in a fixed order, to the record writer.
    fn write_to(&self, out: &mut RecordWriter) -> CodecResult<()>;

    /// Deep copy sharing no mutable state with `self`.
    ///
    /// Called on every value leaving the store's cache, so a caller can
    /// never mutate cached state through a returned record.
    fn deep_clone(&self) -> Box<dyn Persistable>;

    /// Downcasting hook for typed access and dynamic equality.
    fn as_any(&self) -> &dyn Any;

    /// Equality across trait objects, usually a downcast-and-compare:
    ///
    /// ```ignore
    /// fn eq_dyn(&self, other: &dyn Persistable) -> bool {
    ///     other.as_any().downcast_ref::<Self>() == Some(self)
    /// }
    /// ```
    fn eq_dyn(&self, other: &dyn Persistable) -> bool;
}

/// Decode side of [`Persistable`], for concrete types.
///
/// Must read the same fields, in the same order and with the same types,
/// as `write_to` wrote them.
pub trait PersistableRead: Persistable + Sized {
    fn read_from(input: &mut RecordReader<'_>) -> CodecResult<Self>;
}

type DecodeFactory =
    Arc<dyn for<'a> Fn(&mut RecordReader<'a>) -> CodecResult<Box<dyn Persistable>> + Send + Sync>;

/// Maps a preference key to the concrete persistable type stored under it.
///
/// Deserializing a persistable record requires knowing which type to
/// decode; the registry pins that choice per key.
#[derive(Clone, Default)]
pub struct PersistableRegistry {
    factories: HashMap<String, DecodeFactory>,
}

impl PersistableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` as the record type stored under `key`.
    ///
    /// Re-registering a key replaces the previous binding.
    pub fn register<T: PersistableRead>(&mut self, key: impl Into<String>) {
        self.factories.insert(
            key.into(),
            Arc::new(|reader| T::read_from(reader).map(|v| Box::new(v) as Box<dyn Persistable>)),
        );
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Decode the field sequence for `key` with its registered type.
    pub(crate) fn decode(
        &self,
        key: &str,
        reader: &mut RecordReader<'_>,
    ) -> CodecResult<Box<dyn Persistable>> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| CodecError::UnregisteredPersistable {
                key: key.to_owned(),
            })?;
        factory(reader)
    }
}

impl fmt::Debug for PersistableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("PersistableRegistry")
            .field("keys", &keys)
            .finish()
    }
}
