use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// One record read back from storage: its name and raw encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedRecord {
    pub name: String,
    pub content: Vec<u8>,
}

/// One pending change inside a commit batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionElement {
    Update { name: String, content: Vec<u8> },
    Remove { name: String },
}

impl TransactionElement {
    pub fn update(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self::Update {
            name: name.into(),
            content,
        }
    }

    pub fn remove(name: impl Into<String>) -> Self {
        Self::Remove { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Update { name, .. } | Self::Remove { name } => name,
        }
    }
}

/// Storage collaborator: fetches records and commits change batches.
///
/// Callers hold [`batch_lock`](Self::batch_lock) across any group of calls
/// that must observe a consistent snapshot; single calls are safe without
/// it. Implementations never cache, the providers above them do.
pub trait FileTransaction: Send + Sync {
    /// Coarse lock serializing multi-call batches against each other.
    fn batch_lock(&self) -> &Mutex<()>;

    /// Every stored record, name and content.
    fn fetch_all(&self) -> StoreResult<Vec<FetchedRecord>>;

    /// Names of every stored record, without reading contents.
    fn fetch_names(&self) -> StoreResult<HashSet<String>>;

    /// One record by name; [`StoreError::MissingRecord`] if absent.
    fn fetch_one(&self, name: &str) -> StoreResult<FetchedRecord>;

    /// Apply a batch of updates and removes.
    fn commit(&self, elements: &[TransactionElement]) -> StoreResult<()>;
}

const RECORD_EXTENSION: &str = ".pref";

/// Directory-backed transaction: one file per record.
///
/// A record named `n` lives at `<dir>/n.pref`. Updates write a temp file
/// and rename it over the target, so a record file is always either the
/// old or the new content. Removes of absent files are no-ops.
#[derive(Debug)]
pub struct DirectoryTransaction {
    dir: PathBuf,
    batch: Mutex<()>,
}

impl DirectoryTransaction {
    /// Open (creating if needed) the record directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            batch: Mutex::new(()),
        })
    }

    /// Record names double as file stems, so path syntax is rejected.
    fn record_path(&self, name: &str) -> StoreResult<PathBuf> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StoreError::InvalidName {
                name: name.to_owned(),
            });
        }
        Ok(self.dir.join(format!("{name}{RECORD_EXTENSION}")))
    }
}

impl FileTransaction for DirectoryTransaction {
    fn batch_lock(&self) -> &Mutex<()> {
        &self.batch
    }

    fn fetch_all(&self) -> StoreResult<Vec<FetchedRecord>> {
        let mut records = Vec::new();
        for name in self.fetch_names()? {
            records.push(self.fetch_one(&name)?);
        }
        Ok(records)
    }

    fn fetch_names(&self) -> StoreResult<HashSet<String>> {
        let mut names = HashSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(RECORD_EXTENSION) {
                names.insert(name.to_owned());
            }
        }
        Ok(names)
    }

    fn fetch_one(&self, name: &str) -> StoreResult<FetchedRecord> {
        let path = self.record_path(name)?;
        match fs::read(&path) {
            Ok(content) => Ok(FetchedRecord {
                name: name.to_owned(),
                content,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::MissingRecord {
                name: name.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn commit(&self, elements: &[TransactionElement]) -> StoreResult<()> {
        for element in elements {
            match element {
                TransactionElement::Update { name, content } => {
                    let path = self.record_path(name)?;
                    let tmp = temp_path(&path);
                    fs::write(&tmp, content)?;
                    fs::rename(&tmp, &path)?;
                    debug!(name = %name, bytes = content.len(), "record updated");
                }
                TransactionElement::Remove { name } => {
                    let path = self.record_path(name)?;
                    match fs::remove_file(&path) {
                        Ok(()) => debug!(name = %name, "record removed"),
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
        Ok(())
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut os = target.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// In-memory transaction for tests and throwaway stores.
#[derive(Debug, Default)]
pub struct MemoryTransaction {
    records: RwLock<HashMap<String, Vec<u8>>>,
    batch: Mutex<()>,
}

impl MemoryTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the commit path.
    pub fn insert(&self, name: impl Into<String>, content: Vec<u8>) {
        self.records
            .write()
            .expect("lock poisoned")
            .insert(name.into(), content);
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileTransaction for MemoryTransaction {
    fn batch_lock(&self) -> &Mutex<()> {
        &self.batch
    }

    fn fetch_all(&self) -> StoreResult<Vec<FetchedRecord>> {
        Ok(self
            .records
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(name, content)| FetchedRecord {
                name: name.clone(),
                content: content.clone(),
            })
            .collect())
    }

    fn fetch_names(&self) -> StoreResult<HashSet<String>> {
        Ok(self
            .records
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }

    fn fetch_one(&self, name: &str) -> StoreResult<FetchedRecord> {
        self.records
            .read()
            .expect("lock poisoned")
            .get(name)
            .map(|content| FetchedRecord {
                name: name.to_owned(),
                content: content.clone(),
            })
            .ok_or_else(|| StoreError::MissingRecord {
                name: name.to_owned(),
            })
    }

    fn commit(&self, elements: &[TransactionElement]) -> StoreResult<()> {
        let mut records = self.records.write().expect("lock poisoned");
        for element in elements {
            match element {
                TransactionElement::Update { name, content } => {
                    records.insert(name.clone(), content.clone());
                }
                TransactionElement::Remove { name } => {
                    records.remove(name);
                }
            }
        }
        Ok(())
    }
}
