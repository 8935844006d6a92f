use std::path::PathBuf;
use std::sync::Arc;

use binprefs_codec::{PersistableRead, PersistableRegistry, SerializerRegistry};
use tracing::debug;

use crate::cache::{CacheProvider, CandidateProvider};
use crate::eager::EagerStrategy;
use crate::error::{StoreError, StoreResult};
use crate::executor::TaskExecutor;
use crate::lazy::LazyStrategy;
use crate::lock::LockFactory;
use crate::store::PreferenceStore;
use crate::strategy::{FetchMode, FetchStrategy};
use crate::transaction::{DirectoryTransaction, FileTransaction};

/// Builder for [`PreferenceStore`].
///
/// A store needs a name and a place to keep records: either a base
/// directory (records land in `<directory>/<name>/`) or an explicit
/// [`FileTransaction`]. Everything else has defaults.
pub struct PreferenceStoreBuilder {
    name: String,
    directory: Option<PathBuf>,
    mode: FetchMode,
    persistables: PersistableRegistry,
    transaction: Option<Arc<dyn FileTransaction>>,
    lock_factory: Option<Arc<LockFactory>>,
}

impl PreferenceStoreBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: None,
            mode: FetchMode::default(),
            persistables: PersistableRegistry::new(),
            transaction: None,
            lock_factory: None,
        }
    }

    /// Base directory for record files. Ignored when an explicit
    /// transaction is set.
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn fetch_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Register `T` as the persistable type stored under `key`.
    pub fn register_persistable<T: PersistableRead>(mut self, key: impl Into<String>) -> Self {
        self.persistables.register::<T>(key);
        self
    }

    /// Use a custom storage backend instead of a record directory.
    pub fn transaction(mut self, transaction: Arc<dyn FileTransaction>) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Share a lock factory across stores so same-named stores serialize
    /// their readers and writers against each other.
    pub fn lock_factory(mut self, factory: Arc<LockFactory>) -> Self {
        self.lock_factory = Some(factory);
        self
    }

    pub fn build(self) -> StoreResult<PreferenceStore> {
        let transaction: Arc<dyn FileTransaction> = match (self.transaction, self.directory) {
            (Some(transaction), _) => transaction,
            (None, Some(dir)) => Arc::new(DirectoryTransaction::open(dir.join(&self.name))?),
            (None, None) => {
                return Err(StoreError::Misconfigured {
                    reason: "either a directory or a transaction is required".to_owned(),
                })
            }
        };

        let lock_factory = self
            .lock_factory
            .unwrap_or_else(|| Arc::new(LockFactory::new()));
        let lock = lock_factory.read_write_lock(&self.name);
        let executor = Arc::new(TaskExecutor::new(&self.name)?);
        let cache = Arc::new(CacheProvider::new());
        let candidates = Arc::new(CandidateProvider::new());
        let registry = Arc::new(SerializerRegistry::new(self.persistables));

        let strategy: Box<dyn FetchStrategy> = match self.mode {
            FetchMode::Eager => Box::new(EagerStrategy::new(
                Arc::clone(&lock),
                &executor,
                Arc::clone(&candidates),
                Arc::clone(&cache),
                Arc::clone(&transaction),
                Arc::clone(&registry),
            )?),
            FetchMode::Lazy => Box::new(LazyStrategy::new(
                Arc::clone(&lock),
                Arc::clone(&executor),
                Arc::clone(&candidates),
                Arc::clone(&cache),
                Arc::clone(&transaction),
                Arc::clone(&registry),
            )?),
        };
        debug!(name = %self.name, mode = ?self.mode, "store built");

        Ok(PreferenceStore {
            name: self.name,
            lock,
            strategy,
            executor,
            transaction,
            registry,
            cache,
            candidates,
        })
    }
}
