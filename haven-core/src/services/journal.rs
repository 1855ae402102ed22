// src/services/journal.rs
//! Journal ledger: id-addressable entries with a mood rating and free-form tags.
//!
//! Queries are read-only filters over the in-memory collection and return
//! entries in insertion order.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::services::ledger::{Ledger, check_range};
use crate::services::mood::{MOOD_MAX, MOOD_MIN};
use crate::services::store::keys;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    /// Instant the entry was written. Always written back as RFC 3339; on
    /// read a date without offset is taken as UTC and a bare `YYYY-MM-DD`
    /// as midnight UTC.
    #[serde(deserialize_with = "iso_date")]
    pub date: DateTime<Utc>,
    pub content: String,
    pub mood: u8,
    pub tags: Vec<String>,
}

/// Fields to overwrite on an existing entry. `None` keeps the current value.
/// The id is never patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalPatch {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub mood: Option<u8>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Mean journal mood for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDayMood {
    pub date: NaiveDate,
    pub average_mood: f64,
}

#[derive(Debug, Clone, Default)]
pub struct JournalLedger {
    entries: Vec<JournalEntry>,
}

impl Ledger for JournalLedger {
    type Item = JournalEntry;
    const KEY: &'static str = keys::JOURNAL_ENTRIES;
    const LABEL: &'static str = "journal data";

    fn from_items(entries: Vec<JournalEntry>) -> Self {
        Self { entries }
    }

    fn items(&self) -> &[JournalEntry] {
        &self.entries
    }

    fn replace_items(&mut self, entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
        std::mem::replace(&mut self.entries, entries)
    }

    fn validate(items: &[JournalEntry]) -> std::result::Result<(), String> {
        let mut seen = HashSet::with_capacity(items.len());
        for (i, e) in items.iter().enumerate() {
            if e.id.is_empty() {
                return Err(format!("entry {i}: empty id"));
            }
            if !seen.insert(e.id.as_str()) {
                return Err(format!("entry {i}: duplicate id `{}`", e.id));
            }
            if !(MOOD_MIN..=MOOD_MAX).contains(&e.mood) {
                return Err(format!(
                    "entry {i}: mood {} outside {MOOD_MIN}..={MOOD_MAX}",
                    e.mood
                ));
            }
        }
        Ok(())
    }
}

impl JournalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Append a new entry with a fresh v4 id.
    pub fn add_entry(
        &mut self,
        content: impl Into<String>,
        mood: u8,
        tags: Vec<String>,
        at: DateTime<Utc>,
    ) -> Result<&JournalEntry> {
        check_range("mood", mood, MOOD_MIN, MOOD_MAX)?;
        self.entries.push(JournalEntry {
            id: Uuid::new_v4().to_string(),
            date: at,
            content: content.into(),
            mood,
            tags,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Merge `patch` into the entry with `id`. Returns `false` (and changes
    /// nothing) when no entry has that id.
    pub fn update_entry(&mut self, id: &str, patch: JournalPatch) -> Result<bool> {
        if let Some(mood) = patch.mood {
            check_range("mood", mood, MOOD_MIN, MOOD_MAX)?;
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(content) = patch.content {
            entry.content = content;
        }
        if let Some(mood) = patch.mood {
            entry.mood = mood;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        Ok(true)
    }

    /// Remove the entry with `id`; `false` when there was none.
    pub fn delete_entry(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn get_by_id(&self, id: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries written on `day` (UTC).
    pub fn by_date(&self, day: NaiveDate) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.date.date_naive() == day)
            .collect()
    }

    /// Entries with `start <= date <= end`.
    pub fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect()
    }

    /// Exact, case-sensitive tag match.
    pub fn by_tag(&self, tag: &str) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Entries with `min <= mood <= max`.
    pub fn by_mood_range(&self, min: u8, max: u8) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.mood >= min && e.mood <= max)
            .collect()
    }

    /// Case-insensitive substring match on content or any tag.
    pub fn search(&self, query: &str) -> Vec<&JournalEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.content.to_lowercase().contains(&needle)
                    || e.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Per-day average of journal moods, in order of each day's first entry.
    pub fn mood_trends(&self) -> Vec<JournalDayMood> {
        let mut days: Vec<(NaiveDate, u64, u64)> = Vec::new();
        for e in &self.entries {
            let day = e.date.date_naive();
            match days.iter_mut().find(|(d, _, _)| *d == day) {
                Some((_, sum, count)) => {
                    *sum += u64::from(e.mood);
                    *count += 1;
                }
                None => days.push((day, u64::from(e.mood), 1)),
            }
        }
        days.into_iter()
            .map(|(date, sum, count)| JournalDayMood {
                date,
                average_mood: sum as f64 / count as f64,
            })
            .collect()
    }
}

fn iso_date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_iso_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("`{raw}` is not an ISO-8601 date")))
}

fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Some(dt.and_utc());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
}
