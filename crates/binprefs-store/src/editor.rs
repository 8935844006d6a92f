use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use binprefs_codec::PrefValue;
use tracing::{debug, warn};

use crate::store::PreferenceStore;
use crate::transaction::TransactionElement;

/// Staged batch of changes against one store.
///
/// Puts and removes accumulate locally; nothing is visible to readers
/// until [`commit`](Self::commit) or [`apply`](Self::apply) consumes the
/// editor. A key both removed and put ends up put. Both finishers update
/// the cache synchronously under the write lock, then hand serialization
/// and the file commit to the worker thread; `commit` additionally blocks
/// until the files are written and reports success.
pub struct Editor<'a> {
    store: &'a PreferenceStore,
    updates: HashMap<String, PrefValue>,
    removes: HashSet<String>,
}

impl<'a> Editor<'a> {
    pub(crate) fn new(store: &'a PreferenceStore) -> Self {
        Self {
            store,
            updates: HashMap::new(),
            removes: HashSet::new(),
        }
    }

    /// Stage a value under `key`. Any [`Into<PrefValue>`] works, so
    /// scalars, strings, byte vectors, string sets, and boxed
    /// persistables all go through this one method.
    pub fn put(mut self, key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        self.updates.insert(key.into(), value.into());
        self
    }

    /// Stage removal of `key`.
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.removes.insert(key.into());
        self
    }

    /// Stage removal of every key currently known to the store.
    pub fn clear(mut self) -> Self {
        self.removes.extend(self.store.candidates.keys());
        self
    }

    /// Apply the batch and block until it is durable. Returns whether the
    /// file commit succeeded; the cache is updated either way.
    pub fn commit(self) -> bool {
        self.perform(true)
    }

    /// Apply the batch without waiting for durability. The cache is
    /// updated before this returns; the file commit completes in the
    /// background and a failure is only logged.
    pub fn apply(self) {
        self.perform(false);
    }

    fn perform(self, blocking: bool) -> bool {
        let Self {
            store,
            updates,
            removes,
        } = self;

        let barrier = {
            let _write = store.lock.write().expect("lock poisoned");
            for name in &removes {
                store.cache.remove(name);
                store.candidates.remove(name);
            }
            for (name, value) in &updates {
                // A persistable under an unregistered key commits fine but
                // cannot be decoded on reload.
                if matches!(value, PrefValue::Persistable(_))
                    && !store.registry.persistables().is_registered(name)
                {
                    warn!(key = %name, "no persistable type registered for key");
                }
                // Candidate first, so a cached name is always a candidate.
                store.candidates.put(name.clone());
                store.cache.put(name.clone(), value.clone());
            }

            let registry = Arc::clone(&store.registry);
            let transaction = Arc::clone(&store.transaction);
            let write_batch = move || {
                let mut elements = Vec::with_capacity(removes.len() + updates.len());
                for name in removes {
                    elements.push(TransactionElement::remove(name));
                }
                for (name, value) in updates {
                    let content = registry.serialize(&value)?;
                    elements.push(TransactionElement::update(name, content));
                }
                transaction.commit(&elements)?;
                debug!(elements = elements.len(), "batch committed");
                Ok(())
            };
            if blocking {
                store.executor.submit(write_batch)
            } else {
                // Nobody waits on an applied batch, so the job logs its
                // own failure.
                store.executor.submit(move || {
                    if let Err(error) = write_batch() {
                        warn!(%error, "background commit failed");
                    }
                    Ok(())
                })
            }
        };

        if blocking {
            barrier.complete_status()
        } else {
            drop(barrier);
            true
        }
    }
}
