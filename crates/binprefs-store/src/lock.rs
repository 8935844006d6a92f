use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Hands out one shared read/write lock per store name.
///
/// Two stores built with the same factory and the same name share a lock,
/// so their readers and writers serialize against each other. The lock
/// guards no data itself; it orders cache reads against editor commits.
#[derive(Debug, Default)]
pub struct LockFactory {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl LockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `name`, created on first use.
    pub fn read_write_lock(&self, name: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().expect("lock poisoned");
        Arc::clone(locks.entry(name.to_owned()).or_default())
    }
}
