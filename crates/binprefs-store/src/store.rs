use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use binprefs_codec::{Persistable, PrefValue, SerializerRegistry};
use tracing::warn;

use crate::cache::{CacheProvider, CandidateProvider};
use crate::editor::Editor;
use crate::error::StoreResult;
use crate::executor::TaskExecutor;
use crate::strategy::FetchStrategy;
use crate::transaction::FileTransaction;

/// File-backed preference store.
///
/// Reads go through the fetch strategy chosen at build time; writes are
/// staged on an [`Editor`] and committed as one batch. Typed getters
/// return the caller's default when the key is absent or holds a value of
/// a different kind.
pub struct PreferenceStore {
    pub(crate) name: String,
    pub(crate) lock: Arc<RwLock<()>>,
    pub(crate) strategy: Box<dyn FetchStrategy>,
    pub(crate) executor: Arc<TaskExecutor>,
    pub(crate) transaction: Arc<dyn FileTransaction>,
    pub(crate) registry: Arc<SerializerRegistry>,
    pub(crate) cache: Arc<CacheProvider>,
    pub(crate) candidates: Arc<CandidateProvider>,
}

impl PreferenceStore {
    /// The store's name, as given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Begin a batch of changes. Nothing is visible or durable until the
    /// editor is committed or applied.
    pub fn edit(&self) -> Editor<'_> {
        Editor::new(self)
    }

    /// Raw value for `key`, if present.
    pub fn get_value(&self, key: &str) -> Option<PrefValue> {
        self.strategy.get_value(key)
    }

    /// Every stored key with its value.
    pub fn get_all(&self) -> StoreResult<BTreeMap<String, PrefValue>> {
        self.strategy.get_all()
    }

    /// Whether `key` currently resolves to a value.
    pub fn contains(&self, key: &str) -> bool {
        self.strategy.contains(key)
    }

    /// Keys of all values resolved in the cache.
    pub fn keys(&self) -> HashSet<String> {
        let _read = self.lock.read().expect("lock poisoned");
        self.cache.keys()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.typed(key, PrefValue::as_bool).unwrap_or(default)
    }

    pub fn get_i8(&self, key: &str, default: i8) -> i8 {
        self.typed(key, PrefValue::as_i8).unwrap_or(default)
    }

    pub fn get_i16(&self, key: &str, default: i16) -> i16 {
        self.typed(key, PrefValue::as_i16).unwrap_or(default)
    }

    pub fn get_char(&self, key: &str, default: char) -> char {
        self.typed(key, PrefValue::as_char).unwrap_or(default)
    }

    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.typed(key, PrefValue::as_i32).unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.typed(key, PrefValue::as_i64).unwrap_or(default)
    }

    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.typed(key, PrefValue::as_f32).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.typed(key, PrefValue::as_f64).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.typed(key, |v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| default.to_owned())
    }

    pub fn get_bytes(&self, key: &str, default: &[u8]) -> Vec<u8> {
        self.typed(key, |v| v.as_bytes().map(<[u8]>::to_vec))
            .unwrap_or_else(|| default.to_vec())
    }

    pub fn get_string_set(&self, key: &str, default: &HashSet<String>) -> HashSet<String> {
        self.typed(key, |v| v.as_string_set().cloned())
            .unwrap_or_else(|| default.clone())
    }

    /// Structured record stored under `key`, if present. The returned box
    /// is a deep copy; mutating it never changes cached state.
    pub fn get_persistable(&self, key: &str) -> Option<Box<dyn Persistable>> {
        match self.strategy.get_value(key)? {
            PrefValue::Persistable(record) => Some(record),
            other => {
                warn!(key, kind = other.kind_name(), "kind mismatch on read");
                None
            }
        }
    }

    fn typed<T>(&self, key: &str, extract: impl Fn(&PrefValue) -> Option<T>) -> Option<T> {
        let value = self.strategy.get_value(key)?;
        let extracted = extract(&value);
        if extracted.is_none() {
            warn!(key, kind = value.kind_name(), "kind mismatch on read");
        }
        extracted
    }
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("name", &self.name)
            .field("cached_keys", &self.cache.keys().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::path::Path;

    use binprefs_codec::error::CodecResult;
    use binprefs_codec::{PersistableRead, RecordReader, RecordWriter};

    use crate::builder::PreferenceStoreBuilder;
    use crate::strategy::FetchMode;

    #[derive(Clone, Debug, PartialEq)]
    struct User {
        name: Option<String>,
        age: i32,
    }

    impl Persistable for User {
        fn write_to(&self, out: &mut RecordWriter) -> CodecResult<()> {
            out.write_string(self.name.as_deref())?;
            out.write_i32(self.age);
            Ok(())
        }

        fn deep_clone(&self) -> Box<dyn Persistable> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn eq_dyn(&self, other: &dyn Persistable) -> bool {
            other.as_any().downcast_ref::<Self>() == Some(self)
        }
    }

    impl PersistableRead for User {
        fn read_from(input: &mut RecordReader<'_>) -> CodecResult<Self> {
            Ok(Self {
                name: input.read_string()?,
                age: input.read_i32()?,
            })
        }
    }

    fn open(dir: &Path, mode: FetchMode) -> PreferenceStore {
        PreferenceStoreBuilder::new("prefs")
            .directory(dir)
            .fetch_mode(mode)
            .register_persistable::<User>("user")
            .build()
            .unwrap()
    }

    const MODES: [FetchMode; 2] = [FetchMode::Eager, FetchMode::Lazy];

    #[test]
    fn typed_getters_round_trip_every_kind() {
        for mode in MODES {
            let dir = tempfile::tempdir().unwrap();
            let store = open(dir.path(), mode);
            let set: HashSet<String> = ["a".to_owned(), "b".to_owned()].into();
            assert!(store
                .edit()
                .put("flag", true)
                .put("byte", -8i8)
                .put("short", -300i16)
                .put("char", 'Ω')
                .put("count", 5i32)
                .put("big", 1i64 << 40)
                .put("ratio", 0.5f32)
                .put("precise", std::f64::consts::PI)
                .put("name", "alice")
                .put("blob", vec![0u8, 255])
                .put("tags", set.clone())
                .commit());

            // Reopen in the same mode so values come back off disk.
            let store = open(dir.path(), mode);
            assert!(store.get_bool("flag", false));
            assert_eq!(store.get_i8("byte", 0), -8);
            assert_eq!(store.get_i16("short", 0), -300);
            assert_eq!(store.get_char("char", ' '), 'Ω');
            assert_eq!(store.get_i32("count", 0), 5);
            assert_eq!(store.get_i64("big", 0), 1i64 << 40);
            assert_eq!(store.get_f32("ratio", 0.0), 0.5);
            assert_eq!(store.get_f64("precise", 0.0), std::f64::consts::PI);
            assert_eq!(store.get_string("name", ""), "alice");
            assert_eq!(store.get_bytes("blob", &[]), vec![0u8, 255]);
            assert_eq!(store.get_string_set("tags", &HashSet::new()), set);
        }
    }

    #[test]
    fn absent_keys_fall_back_to_defaults() {
        for mode in MODES {
            let dir = tempfile::tempdir().unwrap();
            let store = open(dir.path(), mode);
            assert_eq!(store.get_i32("missing", 42), 42);
            assert_eq!(store.get_string("missing", "fallback"), "fallback");
            assert!(!store.contains("missing"));
        }
    }

    #[test]
    fn kind_mismatch_reads_as_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.edit().put("count", 5i32).commit());
        assert_eq!(store.get_i64("count", -1), -1);
        assert_eq!(store.get_string("count", "none"), "none");
    }

    #[test]
    fn persistable_records_survive_a_reopen() {
        let user = User {
            name: Some("alice".to_owned()),
            age: 30,
        };
        for mode in MODES {
            let dir = tempfile::tempdir().unwrap();
            let store = open(dir.path(), mode);
            assert!(store
                .edit()
                .put("user", Box::new(user.clone()) as Box<dyn Persistable>)
                .commit());

            let store = open(dir.path(), mode);
            let read = store.get_persistable("user").unwrap();
            assert_eq!(read.as_any().downcast_ref::<User>(), Some(&user));
        }
    }

    #[test]
    fn returned_values_never_alias_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        let user = User {
            name: None,
            age: 30,
        };
        assert!(store
            .edit()
            .put("user", Box::new(user) as Box<dyn Persistable>)
            .commit());

        let first = store.get_persistable("user").unwrap();
        let second = store.get_persistable("user").unwrap();
        let first_ptr = first.as_ref() as *const dyn Persistable as *const ();
        let second_ptr = second.as_ref() as *const dyn Persistable as *const ();
        assert_ne!(first_ptr, second_ptr);
    }

    #[test]
    fn remove_then_put_of_one_key_ends_up_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.edit().put("k", 1i32).commit());
        assert!(store.edit().remove("k").put("k", 2i32).commit());
        assert_eq!(store.get_i32("k", 0), 2);
    }

    #[test]
    fn clear_removes_everything_including_unresolved_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.edit().put("a", 1i32).put("b", 2i32).commit());

        // Lazy reopen: neither key has been read yet when clear runs.
        let store = open(dir.path(), FetchMode::Lazy);
        assert!(store.edit().clear().commit());
        assert_eq!(store.get_i32("a", 0), 0);
        assert!(store.get_all().unwrap().is_empty());

        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn apply_is_visible_immediately_and_durable_eventually() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Lazy);
        store.edit().put("count", 7i32).apply();
        assert_eq!(store.get_i32("count", 0), 7);

        // Dropping the store joins the worker, so the write is on disk.
        drop(store);
        let store = open(dir.path(), FetchMode::Lazy);
        assert_eq!(store.get_i32("count", 0), 7);
    }

    #[test]
    fn both_modes_agree_on_the_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.edit().put("count", 5i32).put("name", "alice").commit());
        drop(store);

        let eager = open(dir.path(), FetchMode::Eager);
        let lazy = open(dir.path(), FetchMode::Lazy);
        assert_eq!(eager.get_all().unwrap(), lazy.get_all().unwrap());
    }

    #[test]
    fn keys_reports_resolved_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.edit().put("a", 1i32).put("b", 2i32).commit());
        drop(store);

        let store = open(dir.path(), FetchMode::Lazy);
        assert!(store.keys().is_empty());
        store.get_i32("a", 0);
        assert_eq!(store.keys(), HashSet::from(["a".to_owned()]));

        let store = open(dir.path(), FetchMode::Eager);
        assert_eq!(store.keys().len(), 2);
    }

    #[test]
    fn cached_keys_are_always_a_subset_of_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        assert!(store.edit().put("a", 1i32).put("b", 2i32).put("c", 3i32).commit());
        assert!(store.cache.keys().is_subset(&store.candidates.keys()));
        drop(store);

        // Lazy reopen, partially resolved: one candidate read, two not.
        let store = open(dir.path(), FetchMode::Lazy);
        assert_eq!(store.get_i32("a", 0), 1);
        assert!(store.cache.keys().is_subset(&store.candidates.keys()));

        assert!(store.edit().put("d", 4i32).remove("b").commit());
        assert!(store.cache.keys().is_subset(&store.candidates.keys()));

        // A miss resolves to the default and disturbs neither set.
        let cached = store.cache.keys();
        let known = store.candidates.keys();
        assert_eq!(store.get_i32("missing", 7), 7);
        assert_eq!(store.cache.keys(), cached);
        assert_eq!(store.candidates.keys(), known);
    }

    #[test]
    fn unregistered_persistable_reads_as_absent_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path(), FetchMode::Eager);
        let user = User {
            name: Some("bob".to_owned()),
            age: 41,
        };
        // "stray" has no registered decoder; the commit still succeeds and
        // the value stays readable from this instance's cache.
        assert!(store
            .edit()
            .put("stray", Box::new(user) as Box<dyn Persistable>)
            .commit());
        assert!(store.get_persistable("stray").is_some());
        drop(store);

        let store = open(dir.path(), FetchMode::Lazy);
        assert!(store.get_persistable("stray").is_none());
        assert!(!store.contains("stray"));
    }

    #[test]
    fn builder_requires_a_storage_location() {
        let result = PreferenceStoreBuilder::new("prefs").build();
        assert!(matches!(result, Err(crate::StoreError::Misconfigured { .. })));
    }

    #[test]
    fn stores_with_different_names_do_not_share_records() {
        let dir = tempfile::tempdir().unwrap();
        let first = PreferenceStoreBuilder::new("first")
            .directory(dir.path())
            .build()
            .unwrap();
        assert!(first.edit().put("k", 1i32).commit());

        let second = PreferenceStoreBuilder::new("second")
            .directory(dir.path())
            .build()
            .unwrap();
        assert!(!second.contains("k"));
        assert_eq!(second.get_i32("k", 0), 0);
    }
}
