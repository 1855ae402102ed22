//! Directory-backed store: one `<key>.json` file per key.
//!
//! Writes go to a `.tmp` sibling and are renamed into place, so a crash never
//! leaves a half-written value behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{StorageBackend, check_quota};
use crate::error::{Result, StoreError};

const SUFFIX: &str = ".json";

#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    capacity: Option<u64>,
}

impl FileBackend {
    /// Open or create the directory. `capacity` caps the total bytes of all value files.
    pub fn open(dir: impl Into<PathBuf>, capacity: Option<u64>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, capacity })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}{SUFFIX}")))
    }

    fn used_bytes_except(&self, skip: &Path) -> Result<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || !is_value_file(&path) {
                continue;
            }
            total += fs::metadata(&path)?.len();
        }
        Ok(total)
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if self.capacity.is_some() {
            let needed = self.used_bytes_except(&path)? + value.len() as u64;
            check_quota(key, needed, self.capacity)?;
        }
        write_atomic(&path, value.as_bytes())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(key) = name.strip_suffix(SUFFIX) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}

// ---------- helpers ----------

fn is_value_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SUFFIX))
}

/// Keys become file names, so only a conservative character set is accepted.
fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
