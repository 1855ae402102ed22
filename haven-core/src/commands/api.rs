// src/commands/api.rs
use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde_json::json;

use crate::backend::{StorageBackend, open_backend};
use crate::commands::init::ensure_initialized;
use crate::config::CoreConfig;
use crate::error::Result;
use crate::services::chat::{ChatLedger, ChatMessage, Role};
use crate::services::journal::{JournalEntry, JournalLedger, JournalPatch};
use crate::services::ledger::Ledger;
use crate::services::mood::{DailyMood, MoodEntry, MoodInsights, MoodLedger};
use crate::services::preferences::{Preferences, PreferencesPatch};
use crate::services::report::WeeklyReport;
use crate::services::store::{VersionedStore, keys};
use crate::utils::logbook::Logbook;

/// One user's local data: preferences, the three ledgers, and the store they
/// live in.
///
/// Ledger mutations always update memory; they reach the backend only while
/// `auto_save` is on. Preferences are written on every change regardless.
pub struct Haven<B: StorageBackend> {
    store: VersionedStore<B>,
    logbook: Logbook,
    preferences: Preferences,
    mood: MoodLedger,
    journal: JournalLedger,
    chat: ChatLedger,
    /// Keys of ledgers that were never read from storage this session. Their
    /// in-memory items are additions on top of whatever is stored.
    unsynced: HashSet<&'static str>,
}

impl Haven<Box<dyn StorageBackend>> {
    /// Lay out `root`, read its config and open the configured backend.
    pub fn open_root(root: &Path) -> anyhow::Result<(Self, CoreConfig)> {
        ensure_initialized(root)?;
        let cfg = CoreConfig::load(root)?;
        let backend = open_backend(&cfg.storage)
            .with_context(|| format!("opening {} storage", cfg.storage.backend.as_str()))?;
        let haven = Haven::open(VersionedStore::new(backend), Logbook::from_config(&cfg.logbook))?;
        Ok((haven, cfg))
    }
}

impl<B: StorageBackend> Haven<B> {
    /// Read preferences, then the ledgers (only when auto-save is on; with it
    /// off the session starts empty, as nothing would be kept anyway).
    pub fn open(store: VersionedStore<B>, logbook: Logbook) -> Result<Self> {
        let mut haven = Self {
            store,
            logbook,
            preferences: Preferences::default(),
            mood: MoodLedger::new(),
            journal: JournalLedger::new(),
            chat: ChatLedger::new(),
            unsynced: HashSet::new(),
        };
        haven.reload()?;
        Ok(haven)
    }

    fn reload(&mut self) -> Result<()> {
        self.preferences = Preferences::load(&self.store)?;
        self.unsynced.clear();
        if self.preferences.auto_save {
            self.mood = MoodLedger::load(&self.store)?;
            self.journal = JournalLedger::load(&self.store)?;
            self.chat = ChatLedger::load(&self.store)?;
        } else {
            self.mood = MoodLedger::new();
            self.journal = JournalLedger::new();
            self.chat = ChatLedger::new();
            self.unsynced
                .extend([MoodLedger::KEY, JournalLedger::KEY, ChatLedger::KEY]);
        }
        tracing::debug!(
            auto_save = self.preferences.auto_save,
            mood = self.mood.len(),
            journal = self.journal.len(),
            chat = self.chat.len(),
            "haven loaded"
        );
        Ok(())
    }

    pub fn store(&self) -> &VersionedStore<B> {
        &self.store
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn mood(&self) -> &MoodLedger {
        &self.mood
    }

    pub fn journal(&self) -> &JournalLedger {
        &self.journal
    }

    pub fn chat(&self) -> &ChatLedger {
        &self.chat
    }

    fn persist<L: Ledger>(&self, ledger: &L) -> Result<()> {
        if self.preferences.auto_save {
            ledger.save(&self.store)?;
        }
        Ok(())
    }

    /// Write all three ledgers, first merging stored items into any ledger
    /// that only holds this session's additions.
    fn flush_all(&mut self) -> Result<()> {
        flush(&self.store, &mut self.unsynced, &mut self.mood)?;
        flush(&self.store, &mut self.unsynced, &mut self.journal)?;
        flush(&self.store, &mut self.unsynced, &mut self.chat)
    }

    // ---------- mood ----------

    pub fn record_mood(&mut self, value: u8, note: Option<String>) -> Result<MoodEntry> {
        let now = self.store.now();
        let entry = self.mood.add_entry(value, note, now)?.clone();
        self.persist(&self.mood)?;
        self.logbook.record(
            "mood",
            "entry_added",
            &json!({ "value": value, "has_note": entry.note.is_some() }),
            "low",
        );
        Ok(entry)
    }

    pub fn mood_insights(&self) -> MoodInsights {
        self.mood.insights_at(self.store.now())
    }

    pub fn daily_moods(&self, days: u32) -> Vec<DailyMood> {
        self.mood.daily_averages_at(self.store.now(), days)
    }

    pub fn import_mood(&mut self, json: &str) -> Result<usize> {
        let n = self.mood.import(json)?;
        self.unsynced.remove(MoodLedger::KEY);
        self.persist(&self.mood)?;
        self.logbook.record("mood", "imported", &json!({ "entries": n }), "medium");
        Ok(n)
    }

    pub fn clear_mood(&mut self) -> Result<()> {
        self.mood.clear();
        self.unsynced.remove(MoodLedger::KEY);
        self.store.remove(keys::MOOD_ENTRIES)?;
        self.logbook.record("mood", "cleared", &json!({}), "medium");
        Ok(())
    }

    // ---------- journal ----------

    pub fn add_journal_entry(
        &mut self,
        content: &str,
        mood: u8,
        tags: Vec<String>,
    ) -> Result<JournalEntry> {
        let now = self.store.now();
        let entry = self.journal.add_entry(content, mood, tags, now)?.clone();
        self.persist(&self.journal)?;
        self.logbook.record(
            "journal",
            "entry_added",
            &json!({
                "id": entry.id,
                "mood": mood,
                "tags": entry.tags,
                "preview": self.logbook.preview(content),
            }),
            "low",
        );
        Ok(entry)
    }

    pub fn update_journal_entry(&mut self, id: &str, patch: JournalPatch) -> Result<bool> {
        let updated = self.journal.update_entry(id, patch)?;
        if updated {
            self.persist(&self.journal)?;
            self.logbook.record("journal", "entry_updated", &json!({ "id": id }), "low");
        }
        Ok(updated)
    }

    pub fn delete_journal_entry(&mut self, id: &str) -> Result<bool> {
        let deleted = self.journal.delete_entry(id);
        if deleted {
            self.persist(&self.journal)?;
            self.logbook.record("journal", "entry_deleted", &json!({ "id": id }), "medium");
        }
        Ok(deleted)
    }

    pub fn import_journal(&mut self, json: &str) -> Result<usize> {
        let n = self.journal.import(json)?;
        self.unsynced.remove(JournalLedger::KEY);
        self.persist(&self.journal)?;
        self.logbook.record("journal", "imported", &json!({ "entries": n }), "medium");
        Ok(n)
    }

    pub fn clear_journal(&mut self) -> Result<()> {
        self.journal.clear();
        self.unsynced.remove(JournalLedger::KEY);
        self.store.remove(keys::JOURNAL_ENTRIES)?;
        self.logbook.record("journal", "cleared", &json!({}), "medium");
        Ok(())
    }

    // ---------- chat ----------

    pub fn add_chat_message(&mut self, role: Role, content: &str) -> Result<ChatMessage> {
        let now = self.store.now();
        let message = self.chat.add_message(role, content, now).clone();
        self.persist(&self.chat)?;
        self.logbook.record(
            "chat",
            "message_added",
            &json!({ "role": role.as_str(), "preview": self.logbook.preview(content) }),
            "low",
        );
        Ok(message)
    }

    pub fn chat_on(&self, day: NaiveDate) -> Vec<&ChatMessage> {
        self.chat.by_date(day)
    }

    pub fn import_chat(&mut self, json: &str) -> Result<usize> {
        let n = self.chat.import(json)?;
        self.unsynced.remove(ChatLedger::KEY);
        self.persist(&self.chat)?;
        self.logbook.record("chat", "imported", &json!({ "messages": n }), "medium");
        Ok(n)
    }

    pub fn clear_chat_history(&mut self) -> Result<()> {
        self.chat.clear();
        self.unsynced.remove(ChatLedger::KEY);
        self.store.remove(keys::CHAT_HISTORY)?;
        self.logbook.record("chat", "cleared", &json!({}), "medium");
        Ok(())
    }

    // ---------- preferences ----------

    /// Apply `patch` and write the result. Switching auto-save on flushes
    /// whatever the ledgers accumulated while it was off, after the stored
    /// history so nothing already saved is lost.
    pub fn update_preferences(&mut self, patch: PreferencesPatch) -> Result<&Preferences> {
        let was_saving = self.preferences.auto_save;
        self.preferences.apply(patch);
        self.preferences.save(&self.store)?;
        if !was_saving && self.preferences.auto_save {
            self.flush_all()?;
            tracing::info!("auto-save enabled; ledgers flushed");
        }
        self.logbook.record(
            "preferences",
            "updated",
            &json!({ "auto_save": self.preferences.auto_save }),
            "low",
        );
        Ok(&self.preferences)
    }

    /// Merge a (possibly partial) exported settings document.
    pub fn import_preferences(&mut self, json: &str) -> Result<&Preferences> {
        let patch = Preferences::parse_patch(json)?;
        self.update_preferences(patch)
    }

    pub fn reset_preferences(&mut self) -> Result<&Preferences> {
        let was_saving = self.preferences.auto_save;
        self.preferences = Preferences::default();
        self.preferences.save(&self.store)?;
        if !was_saving {
            self.flush_all()?;
        }
        self.logbook.record("preferences", "reset", &json!({}), "low");
        Ok(&self.preferences)
    }

    // ---------- session summary ----------

    pub fn set_session_summary(&self, summary: &str) -> Result<()> {
        self.store.set(keys::SESSION_SUMMARY, summary)?;
        self.logbook.record(
            "session",
            "summary_saved",
            &json!({ "preview": self.logbook.preview(summary) }),
            "low",
        );
        Ok(())
    }

    pub fn session_summary(&self) -> Result<Option<String>> {
        self.store.get(keys::SESSION_SUMMARY)
    }

    pub fn clear_session_summary(&self) -> Result<()> {
        self.store.remove(keys::SESSION_SUMMARY)
    }

    // ---------- reports / backup ----------

    pub fn weekly_report(&self, top_tags: usize) -> WeeklyReport {
        WeeklyReport::build(&self.mood, &self.journal, self.store.now(), top_tags)
    }

    pub fn backup(&self) -> Result<String> {
        let snapshot = self.store.backup()?;
        self.logbook.record("store", "backup", &json!({ "bytes": snapshot.len() }), "low");
        Ok(snapshot)
    }

    /// Replace the whole namespace and reload preferences and ledgers from it.
    pub fn restore(&mut self, snapshot: &str) -> Result<usize> {
        let n = self.store.restore(snapshot)?;
        self.reload()?;
        self.logbook.record("store", "restore", &json!({ "keys": n }), "high");
        Ok(n)
    }
}

fn flush<B: StorageBackend, L: Ledger>(
    store: &VersionedStore<B>,
    unsynced: &mut HashSet<&'static str>,
    ledger: &mut L,
) -> Result<()> {
    if unsynced.remove(L::KEY) {
        ledger.merge_stored(store)?;
    }
    ledger.save(store)
}
