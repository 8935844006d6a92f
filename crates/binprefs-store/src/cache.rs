use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use binprefs_codec::PrefValue;

/// In-memory cache of resolved preference values.
///
/// Holds only values that have already been decoded; which names exist at
/// all is tracked separately by [`CandidateProvider`]. Every name cached
/// here is also a candidate, never the other way around.
#[derive(Debug, Default)]
pub struct CacheProvider {
    values: RwLock<HashMap<String, PrefValue>>,
}

impl CacheProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<PrefValue> {
        self.values
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn put(&self, name: impl Into<String>, value: PrefValue) {
        self.values
            .write()
            .expect("lock poisoned")
            .insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values
            .read()
            .expect("lock poisoned")
            .contains_key(name)
    }

    pub fn keys(&self) -> HashSet<String> {
        self.values
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Snapshot of all cached entries.
    pub fn get_all(&self) -> HashMap<String, PrefValue> {
        self.values.read().expect("lock poisoned").clone()
    }

    pub fn remove(&self, name: &str) {
        self.values.write().expect("lock poisoned").remove(name);
    }
}

/// Names of all records known to exist, resolved or not.
///
/// The lazy strategy populates this from the record names on disk at
/// startup, then fetches values into the [`CacheProvider`] on demand.
#[derive(Debug, Default)]
pub struct CandidateProvider {
    names: RwLock<HashSet<String>>,
}

impl CandidateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, name: impl Into<String>) {
        self.names.write().expect("lock poisoned").insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.read().expect("lock poisoned").contains(name)
    }

    pub fn keys(&self) -> HashSet<String> {
        self.names.read().expect("lock poisoned").clone()
    }

    pub fn remove(&self, name: &str) {
        self.names.write().expect("lock poisoned").remove(name);
    }
}
