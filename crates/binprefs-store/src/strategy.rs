use std::collections::BTreeMap;

use binprefs_codec::PrefValue;

use crate::error::StoreResult;

/// When the store pulls record values off disk into its cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Resolve record names up front, values on first read of each key.
    #[default]
    Lazy,
    /// Read and decode every record at construction; reads never touch
    /// disk afterwards.
    Eager,
}

/// Read side of the store, implemented per [`FetchMode`].
///
/// Every returned value is a defensive copy; mutating it never changes
/// cached state.
pub trait FetchStrategy: Send + Sync {
    /// Resolved value for `key`, or `None` when absent (or, for the lazy
    /// strategy, when its on-demand fetch fails).
    fn get_value(&self, key: &str) -> Option<PrefValue>;

    /// Every stored key with its resolved value.
    fn get_all(&self) -> StoreResult<BTreeMap<String, PrefValue>>;

    /// Whether `key` is resolved in the cache. The lazy strategy also
    /// requires the key to name an existing record, so a key can be a
    /// known candidate yet not yet `contains`.
    fn contains(&self, key: &str) -> bool;
}
