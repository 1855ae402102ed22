// src/services/mod.rs

pub mod store;        // envelopes over a raw backend; the only backend writer
pub mod ledger;       // shared load/save/export/import contract
pub mod mood;
pub mod journal;
pub mod chat;
pub mod preferences;
pub mod report;       // weekly digest over mood + journal

// Public API
pub use chat::{ChatLedger, ChatMessage, Role};
pub use journal::{JournalDayMood, JournalEntry, JournalLedger, JournalPatch};
pub use ledger::Ledger;
pub use mood::{DailyMood, MoodEntry, MoodInsights, MoodLedger, Trend};
pub use preferences::{FontSize, Preferences, PreferencesPatch, Theme};
pub use report::{TagCount, WeeklyReport};
pub use store::{StorageEnvelope, VersionedStore, keys};
