use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use binprefs_codec::{PrefValue, SerializerRegistry};

use crate::cache::{CacheProvider, CandidateProvider};
use crate::error::StoreResult;
use crate::executor::TaskExecutor;
use crate::strategy::FetchStrategy;
use crate::transaction::FileTransaction;

/// Strategy that resolves values on first read.
///
/// Construction only lists record names into the candidate set; each key's
/// bytes are read and decoded the first time that key is requested, then
/// served from the cache. A failed on-demand fetch is logged and the key
/// reads as absent; `get_all` propagates failures instead.
pub struct LazyStrategy {
    lock: Arc<RwLock<()>>,
    executor: Arc<TaskExecutor>,
    candidates: Arc<CandidateProvider>,
    cache: Arc<CacheProvider>,
    transaction: Arc<dyn FileTransaction>,
    registry: Arc<SerializerRegistry>,
}

impl LazyStrategy {
    pub fn new(
        lock: Arc<RwLock<()>>,
        executor: Arc<TaskExecutor>,
        candidates: Arc<CandidateProvider>,
        cache: Arc<CacheProvider>,
        transaction: Arc<dyn FileTransaction>,
        registry: Arc<SerializerRegistry>,
    ) -> StoreResult<Self> {
        let strategy = Self {
            lock,
            executor,
            candidates,
            cache,
            transaction,
            registry,
        };
        {
            let _read = strategy.lock.read().expect("lock poisoned");
            for name in strategy.transaction.fetch_names()? {
                strategy.candidates.put(name);
            }
        }
        Ok(strategy)
    }

    /// Fetch job for one key, run on the worker thread.
    fn fetch_job(&self, key: &str) -> impl FnOnce() -> StoreResult<PrefValue> + Send + 'static {
        let transaction = Arc::clone(&self.transaction);
        let registry = Arc::clone(&self.registry);
        let cache = Arc::clone(&self.cache);
        let key = key.to_owned();
        move || {
            let record = transaction.fetch_one(&key)?;
            let value = registry.deserialize(&key, &record.content)?;
            cache.put(key, value.clone());
            Ok(value)
        }
    }

    /// Cache hit, or an on-demand fetch whose failure reads as absent.
    fn resolve_or_absent(&self, key: &str) -> Option<PrefValue> {
        if let Some(value) = self.cache.get(key) {
            return Some(value);
        }
        if !self.candidates.contains(key) {
            return None;
        }
        let _batch = self.transaction.batch_lock().lock().expect("lock poisoned");
        self.executor.submit(self.fetch_job(key)).complete_ok()
    }

    /// Cache hit, or an on-demand fetch whose failure propagates.
    fn resolve(&self, key: &str) -> StoreResult<PrefValue> {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }
        let _batch = self.transaction.batch_lock().lock().expect("lock poisoned");
        self.executor.submit(self.fetch_job(key)).complete_blocking()
    }
}

impl FetchStrategy for LazyStrategy {
    fn get_value(&self, key: &str) -> Option<PrefValue> {
        let _read = self.lock.read().expect("lock poisoned");
        self.resolve_or_absent(key)
            .map(|value| self.registry.redefine_mutable(&value))
    }

    fn get_all(&self) -> StoreResult<BTreeMap<String, PrefValue>> {
        let _read = self.lock.read().expect("lock poisoned");
        let mut all = BTreeMap::new();
        for key in self.candidates.keys() {
            let value = self.resolve(&key)?;
            let copy = self.registry.redefine_mutable(&value);
            all.insert(key, copy);
        }
        Ok(all)
    }

    fn contains(&self, key: &str) -> bool {
        let _read = self.lock.read().expect("lock poisoned");
        self.candidates.contains(key) && self.cache.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::MemoryTransaction;

    fn registry() -> Arc<SerializerRegistry> {
        Arc::new(SerializerRegistry::default())
    }

    fn build(transaction: Arc<dyn FileTransaction>) -> LazyStrategy {
        LazyStrategy::new(
            Arc::new(RwLock::new(())),
            Arc::new(TaskExecutor::new("lazy-test").unwrap()),
            Arc::new(CandidateProvider::new()),
            Arc::new(CacheProvider::new()),
            transaction,
            registry(),
        )
        .unwrap()
    }

    fn seeded() -> Arc<MemoryTransaction> {
        let txn = Arc::new(MemoryTransaction::new());
        let registry = registry();
        txn.insert("count", registry.serialize(&PrefValue::Int(5)).unwrap());
        txn.insert(
            "name",
            registry.serialize(&PrefValue::String("alice".into())).unwrap(),
        );
        txn
    }

    #[test]
    fn values_resolve_on_first_read() {
        let strategy = build(seeded());
        // Known candidate, not yet resolved.
        assert!(!strategy.contains("count"));
        assert_eq!(strategy.get_value("count"), Some(PrefValue::Int(5)));
        // Resolved now.
        assert!(strategy.contains("count"));
        assert!(strategy.cache.contains("count"));
        assert!(!strategy.cache.contains("name"));
    }

    #[test]
    fn unknown_key_reads_as_absent_without_disk_access() {
        let strategy = build(seeded());
        assert_eq!(strategy.get_value("missing"), None);
        assert!(!strategy.contains("missing"));
    }

    #[test]
    fn corrupt_record_reads_as_absent() {
        let txn = Arc::new(MemoryTransaction::new());
        txn.insert("bad", vec![0x7F]);
        let strategy = build(txn);
        // The name is a candidate, but its fetch fails and is swallowed.
        assert_eq!(strategy.get_value("bad"), None);
        assert!(!strategy.contains("bad"));
    }

    #[test]
    fn get_all_resolves_everything_and_propagates_errors() {
        let strategy = build(seeded());
        let all = strategy.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["count"], PrefValue::Int(5));
        assert_eq!(all["name"], PrefValue::String("alice".into()));

        let txn = Arc::new(MemoryTransaction::new());
        txn.insert("bad", vec![0x7F]);
        let strategy = build(txn);
        assert!(strategy.get_all().is_err());
    }

    #[test]
    fn backing_store_is_read_at_most_once_per_key() {
        let txn = seeded();
        let strategy = build(Arc::clone(&txn) as Arc<dyn FileTransaction>);
        assert_eq!(strategy.get_value("count"), Some(PrefValue::Int(5)));
        // A later change to the backing record is not observed once cached.
        txn.insert(
            "count",
            registry().serialize(&PrefValue::Int(99)).unwrap(),
        );
        assert_eq!(strategy.get_value("count"), Some(PrefValue::Int(5)));
    }
}
