use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use binprefs_codec::{PrefValue, SerializerRegistry};

use crate::cache::{CacheProvider, CandidateProvider};
use crate::error::StoreResult;
use crate::executor::TaskExecutor;
use crate::strategy::FetchStrategy;
use crate::transaction::FileTransaction;

/// Strategy that loads the whole store into the cache at construction.
///
/// Construction blocks until every record is decoded and propagates the
/// first failure, so a corrupt record surfaces before the store exists.
/// After that, every read is answered from the cache alone.
pub struct EagerStrategy {
    lock: Arc<RwLock<()>>,
    cache: Arc<CacheProvider>,
    registry: Arc<SerializerRegistry>,
}

impl EagerStrategy {
    pub fn new(
        lock: Arc<RwLock<()>>,
        executor: &TaskExecutor,
        candidates: Arc<CandidateProvider>,
        cache: Arc<CacheProvider>,
        transaction: Arc<dyn FileTransaction>,
        registry: Arc<SerializerRegistry>,
    ) -> StoreResult<Self> {
        {
            let _batch = transaction.batch_lock().lock().expect("lock poisoned");
            let _read = lock.read().expect("lock poisoned");
            let job = {
                let candidates = Arc::clone(&candidates);
                let cache = Arc::clone(&cache);
                let transaction = Arc::clone(&transaction);
                let registry = Arc::clone(&registry);
                move || fetch_cache(&candidates, &cache, transaction.as_ref(), &registry)
            };
            executor.submit(job).complete_blocking()?;
        }
        Ok(Self {
            lock,
            cache,
            registry,
        })
    }
}

fn fetch_cache(
    candidates: &CandidateProvider,
    cache: &CacheProvider,
    transaction: &dyn FileTransaction,
    registry: &SerializerRegistry,
) -> StoreResult<()> {
    if !should_fetch(candidates, cache) {
        return Ok(());
    }
    for record in transaction.fetch_all()? {
        let value = registry.deserialize(&record.name, &record.content)?;
        // Candidate first, so a cached name is always also a candidate.
        candidates.put(record.name.clone());
        cache.put(record.name, value);
    }
    Ok(())
}

/// Skip the disk pass when the cache already resolves every candidate.
fn should_fetch(candidates: &CandidateProvider, cache: &CacheProvider) -> bool {
    !candidates.keys().is_subset(&cache.keys())
}

impl FetchStrategy for EagerStrategy {
    fn get_value(&self, key: &str) -> Option<PrefValue> {
        let _read = self.lock.read().expect("lock poisoned");
        self.cache
            .get(key)
            .map(|value| self.registry.redefine_mutable(&value))
    }

    fn get_all(&self) -> StoreResult<BTreeMap<String, PrefValue>> {
        let _read = self.lock.read().expect("lock poisoned");
        Ok(self
            .cache
            .get_all()
            .into_iter()
            .map(|(key, value)| {
                let copy = self.registry.redefine_mutable(&value);
                (key, copy)
            })
            .collect())
    }

    fn contains(&self, key: &str) -> bool {
        let _read = self.lock.read().expect("lock poisoned");
        self.cache.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::MemoryTransaction;

    fn registry() -> Arc<SerializerRegistry> {
        Arc::new(SerializerRegistry::default())
    }

    fn build(transaction: Arc<dyn FileTransaction>) -> StoreResult<EagerStrategy> {
        let executor = TaskExecutor::new("eager-test").unwrap();
        EagerStrategy::new(
            Arc::new(RwLock::new(())),
            &executor,
            Arc::new(CandidateProvider::new()),
            Arc::new(CacheProvider::new()),
            transaction,
            registry(),
        )
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
    fn construction_resolves_every_record() {
        let strategy = build(seeded()).unwrap();
        assert_eq!(strategy.get_value("count"), Some(PrefValue::Int(5)));
        assert_eq!(
            strategy.get_value("name"),
            Some(PrefValue::String("alice".into()))
        );
        assert!(strategy.contains("count"));
        assert!(!strategy.contains("missing"));
        assert_eq!(strategy.get_all().unwrap().len(), 2);
    }

    #[test]
    fn reads_never_touch_disk_after_construction() {
        let txn = seeded();
        let strategy = build(Arc::clone(&txn) as Arc<dyn FileTransaction>).unwrap();
        // Mutating the backing store is invisible to an eager strategy.
        txn.insert("late", vec![0x12]);
        assert_eq!(strategy.get_value("late"), None);
        assert!(!strategy.contains("late"));
    }

    #[test]
    fn corrupt_record_fails_construction() {
        let txn = Arc::new(MemoryTransaction::new());
        txn.insert("bad", vec![0x7F]);
        assert!(build(txn).is_err());
    }

    #[test]
    fn should_fetch_compares_candidates_to_cache() {
        let candidates = CandidateProvider::new();
        let cache = CacheProvider::new();
        assert!(!should_fetch(&candidates, &cache));

        candidates.put("a");
        assert!(should_fetch(&candidates, &cache));

        cache.put("a", PrefValue::Bool(true));
        assert!(!should_fetch(&candidates, &cache));

        // Extra cached entries never force a fetch.
        cache.put("b", PrefValue::Bool(false));
        assert!(!should_fetch(&candidates, &cache));
    }
}
