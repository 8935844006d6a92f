//! File-backed binary preference store.
//!
//! Each named store keeps one encoded file per key under its own
//! directory and answers reads from an in-memory cache. How the cache is
//! populated is the build-time [`FetchMode`] choice:
//!
//! - [`FetchMode::Eager`] reads and decodes every record while the store
//!   is being built; reads never touch disk afterwards.
//! - [`FetchMode::Lazy`] lists record names up front and resolves each
//!   key's value on its first read.
//!
//! Writes are staged on an [`Editor`] and land as one batch: the cache is
//! updated synchronously under the store's write lock, then a dedicated
//! worker thread serializes the values and commits the files.
//! [`Editor::commit`] blocks until the batch is durable;
//! [`Editor::apply`] returns as soon as the cache is updated.
//!
//! ```no_run
//! use binprefs_store::{FetchMode, PreferenceStoreBuilder};
//!
//! # fn main() -> binprefs_store::StoreResult<()> {
//! let store = PreferenceStoreBuilder::new("settings")
//!     .directory("/var/lib/myapp")
//!     .fetch_mode(FetchMode::Lazy)
//!     .build()?;
//!
//! store.edit().put("count", 5i32).put("name", "alice").commit();
//! assert_eq!(store.get_i32("count", 0), 5);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod editor;
pub mod error;
pub mod executor;
pub mod lock;
pub mod store;
pub mod strategy;
pub mod transaction;

mod eager;
mod lazy;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::PreferenceStoreBuilder;
pub use editor::Editor;
pub use error::{StoreError, StoreResult};
pub use lock::LockFactory;
pub use store::PreferenceStore;
pub use strategy::{FetchMode, FetchStrategy};
pub use transaction::{
    DirectoryTransaction, FetchedRecord, FileTransaction, MemoryTransaction, TransactionElement,
};

// Callers implement persistables against the codec crate's traits.
pub use binprefs_codec::{
    Persistable, PersistableRead, PersistableRegistry, PrefValue, RecordReader, RecordWriter,
    SerializerRegistry,
};
