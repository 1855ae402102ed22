// src/services/store.rs
//! Versioned key/value store.
//!
//! Every value is written as `{ value, timestamp, version }` and every read
//! unwraps it again, so callers only ever see their own types.
//!
//! - Missing key → `Ok(None)`.
//! - Undecodable envelope → `StoreError::StorageCorruption`.
//! - `update` is a plain read-modify-write; two writers racing on one key lose
//!   one update (last write wins).
//! - The version stamp is informational. A mismatch is logged and the value is
//!   returned as-is; there is no migration path.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::StorageBackend;
use crate::error::{Result, StoreError};
use crate::utils::clock::{Clock, SystemClock};

/// Version stamped into every envelope.
pub const STORAGE_VERSION: &str = "1.0.0";

/// Persisted key namespace. These strings are part of the on-disk format.
pub mod keys {
    pub const CHAT_HISTORY: &str = "chatHistory";
    pub const JOURNAL_ENTRIES: &str = "journalEntries";
    pub const MOOD_ENTRIES: &str = "moodEntries";
    pub const USER_PREFERENCES: &str = "userPreferences";
    pub const SESSION_SUMMARY: &str = "sessionSummary";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEnvelope<T> {
    pub value: T,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub version: String,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    value: &'a T,
    timestamp: i64,
    version: &'a str,
}

#[derive(Deserialize)]
struct EnvelopeStamp {
    #[allow(dead_code)]
    value: IgnoredAny,
    timestamp: i64,
}

pub struct VersionedStore<B: StorageBackend> {
    backend: B,
    clock: Arc<dyn Clock>,
}

impl<B: StorageBackend> VersionedStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Wrap `value` in a fresh envelope and overwrite whatever is at `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let envelope = EnvelopeRef {
            value,
            timestamp: self.clock.now_ms(),
            version: STORAGE_VERSION,
        };
        let text = serde_json::to_string(&envelope).map_err(StoreError::Encode)?;
        self.backend.set_item(key, &text)?;
        tracing::debug!(key, bytes = text.len(), "store set");
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.get_envelope(key)?.map(|e| e.value))
    }

    /// Read the whole envelope, stamp included.
    pub fn get_envelope<T: DeserializeOwned>(&self, key: &str) -> Result<Option<StorageEnvelope<T>>> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        let envelope: StorageEnvelope<T> = decode(key, &raw)?;
        if envelope.version != STORAGE_VERSION {
            tracing::debug!(
                key,
                found = %envelope.version,
                expected = STORAGE_VERSION,
                "envelope version mismatch; reading as-is"
            );
        }
        Ok(Some(envelope))
    }

    /// Read-modify-write. Not atomic with respect to other writers.
    pub fn update<T, F>(&self, key: &str, updater: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let next = updater(self.get(key)?);
        self.set(key, &next)?;
        Ok(next)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove_item(key)?;
        tracing::debug!(key, "store remove");
        Ok(())
    }

    /// Drop every key in the namespace.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear()?;
        tracing::debug!("store cleared");
        Ok(())
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.backend.get_item(key)?.is_some())
    }

    /// Write time (ms since epoch) of the envelope at `key`.
    pub fn get_timestamp(&self, key: &str) -> Result<Option<i64>> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        let stamp: EnvelopeStamp = decode(key, &raw)?;
        Ok(Some(stamp.timestamp))
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.backend.keys()
    }

    /// Every key mapped to its unwrapped value.
    pub fn get_all(&self) -> Result<BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        for key in self.backend.keys()? {
            if let Some(value) = self.get::<Value>(&key)? {
                out.insert(key, value);
            }
        }
        Ok(out)
    }

    /// Serialize the whole namespace (envelopes unwrapped) as one JSON object.
    pub fn backup(&self) -> Result<String> {
        let all = self.get_all()?;
        tracing::info!(keys = all.len(), "backup created");
        serde_json::to_string(&all).map_err(StoreError::Encode)
    }

    /// Replace the namespace with a snapshot produced by [`backup`](Self::backup).
    ///
    /// The snapshot is decoded before anything is touched; a malformed snapshot
    /// fails with `InvalidFormat` and leaves the store as it was. Once writing
    /// starts there is no rollback: keys restored before a failing write stay.
    pub fn restore(&self, snapshot: &str) -> Result<usize> {
        let data: BTreeMap<String, Value> = serde_json::from_str(snapshot)
            .map_err(|e| StoreError::invalid_format("backup snapshot", e))?;
        self.clear()?;
        for (key, value) in &data {
            self.set(key, value)?;
        }
        tracing::info!(keys = data.len(), "backup restored");
        Ok(data.len())
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| StoreError::StorageCorruption {
        key: key.to_string(),
        source,
    })
}
