//! backend/mod.rs
//!
//! Raw string key/value backends. Nothing here knows about envelopes or
//! ledgers; `services::store::VersionedStore` layers those on top.

mod file;
mod memory;
mod sqlite;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::config::{BackendKind, StorageConfig};
use crate::error::Result;

/// Synchronous key/value storage with enumerable keys.
///
/// Writes that would exceed a backend's capacity fail with
/// `StoreError::QuotaExceeded` and leave the previous value in place.
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is a no-op.
    fn remove_item(&self, key: &str) -> Result<()>;
    /// All keys currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>>;
    fn clear(&self) -> Result<()>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Open whichever backend the storage config selects.
pub fn open_backend(cfg: &StorageConfig) -> Result<Box<dyn StorageBackend>> {
    let capacity = cfg.capacity();
    let backend: Box<dyn StorageBackend> = match cfg.backend {
        BackendKind::Sqlite => Box::new(SqliteBackend::open(cfg.path(), capacity)?),
        BackendKind::File => Box::new(FileBackend::open(cfg.path(), capacity)?),
        BackendKind::Memory => Box::new(MemoryBackend::with_capacity(capacity)),
    };
    tracing::debug!(backend = cfg.backend.as_str(), "storage backend opened");
    Ok(backend)
}

pub(crate) fn check_quota(key: &str, needed: u64, capacity: Option<u64>) -> Result<()> {
    match capacity {
        Some(cap) if needed > cap => Err(crate::StoreError::QuotaExceeded {
            key: key.to_string(),
            needed,
            capacity: cap,
        }),
        _ => Ok(()),
    }
}
