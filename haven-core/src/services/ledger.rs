//! services/ledger.rs
//!
//! The persistence contract every collection ledger shares.
//!
//! A ledger owns its in-memory items. Mutators never touch storage; whoever
//! drives the ledger decides whether to `save` afterwards (that is where the
//! auto-save preference is honoured). Export writes the raw item array, not
//! the envelope, so exported files re-import on any backend.

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::StorageBackend;
use crate::error::{Result, StoreError};
use crate::services::store::VersionedStore;

pub trait Ledger: Sized {
    type Item: Serialize + DeserializeOwned;

    /// Storage key the collection lives under.
    const KEY: &'static str;
    /// Human label used in `InvalidFormat` errors.
    const LABEL: &'static str;

    fn from_items(items: Vec<Self::Item>) -> Self;
    fn items(&self) -> &[Self::Item];
    /// Swap in `items`, handing back what was there.
    fn replace_items(&mut self, items: Vec<Self::Item>) -> Vec<Self::Item>;

    /// Shape checks beyond what decoding already guarantees.
    fn validate(_items: &[Self::Item]) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Read the collection; a missing key yields an empty ledger.
    fn load<B: StorageBackend>(store: &VersionedStore<B>) -> Result<Self> {
        let items = store.get::<Vec<Self::Item>>(Self::KEY)?.unwrap_or_default();
        Ok(Self::from_items(items))
    }

    fn save<B: StorageBackend>(&self, store: &VersionedStore<B>) -> Result<()> {
        store.set(Self::KEY, self.items())
    }

    /// Put the stored collection in front of the items held in memory.
    ///
    /// For a ledger whose in-memory items are only what one session added on
    /// top of storage; saving afterwards keeps both.
    fn merge_stored<B: StorageBackend>(&mut self, store: &VersionedStore<B>) -> Result<()> {
        let mut items = store.get::<Vec<Self::Item>>(Self::KEY)?.unwrap_or_default();
        let session = self.replace_items(Vec::new());
        let stored = items.len();
        items.extend(session);
        self.replace_items(items);
        tracing::debug!(ledger = Self::KEY, stored, "merged stored items");
        Ok(())
    }

    /// Pretty-printed (2-space) JSON array of the items.
    fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self.items()).map_err(StoreError::Encode)
    }

    /// Replace every item with the decoded payload. On `InvalidFormat` the
    /// ledger is left untouched.
    fn import(&mut self, json: &str) -> Result<usize> {
        let items: Vec<Self::Item> =
            serde_json::from_str(json).map_err(|e| StoreError::invalid_format(Self::LABEL, e))?;
        Self::validate(&items).map_err(|reason| StoreError::invalid_format(Self::LABEL, reason))?;
        let n = items.len();
        self.replace_items(items);
        tracing::info!(ledger = Self::KEY, items = n, "ledger imported");
        Ok(n)
    }

    fn clear(&mut self) {
        self.replace_items(Vec::new());
    }

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

pub const DAY_MS: i64 = 86_400_000;

/// Inclusive `[start, end]` millisecond bounds of a UTC calendar day.
pub fn day_bounds_ms(day: NaiveDate) -> (i64, i64) {
    let start = day
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .timestamp_millis();
    (start, start + DAY_MS - 1)
}

pub(crate) fn check_range(field: &'static str, value: u8, min: u8, max: u8) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(StoreError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        })
    }
}
