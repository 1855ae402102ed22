//! Single-table SQLite backend.
//!
//! - One connection, WAL journal.
//! - `kv(key, value, updated_at)`; `updated_at` is RFC3339 UTC and only
//!   informational (the envelope carries the authoritative timestamp).

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use super::{StorageBackend, check_quota};
use crate::error::Result;

pub struct SqliteBackend {
    db: Connection,
    capacity: Option<u64>,
}

impl SqliteBackend {
    /// Open/create the database file (and its parent directory) and ensure the schema.
    pub fn open(path: impl AsRef<Path>, capacity: Option<u64>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?, capacity)
    }

    pub fn open_in_memory(capacity: Option<u64>) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, capacity)
    }

    fn init(db: Connection, capacity: Option<u64>) -> Result<Self> {
        db.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS kv (
              key        TEXT PRIMARY KEY,
              value      TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { db, capacity })
    }

    fn used_bytes_except(&self, key: &str) -> Result<u64> {
        let used: i64 = self.db.query_row(
            "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
             FROM kv WHERE key <> ?1",
            [key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as u64)
    }
}

impl StorageBackend for SqliteBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.capacity.is_some() {
            let needed = self.used_bytes_except(key)? + (key.len() + value.len()) as u64;
            check_quota(key, needed, self.capacity)?;
        }
        self.db.execute(
            r#"
            INSERT INTO kv(key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
              value      = excluded.value,
              updated_at = excluded.updated_at
            "#,
            (key, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.db.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn clear(&self) -> Result<()> {
        self.db.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}
