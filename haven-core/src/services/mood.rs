// src/services/mood.rs
//! Mood ledger: append-only mood samples plus the analytics built on them.
//!
//! Windows are trailing spans of `days * 24h` ending at `now`. Daily buckets
//! are UTC calendar days.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::ledger::{DAY_MS, Ledger, check_range, day_bounds_ms};
use crate::services::store::keys;

pub const MOOD_MIN: u8 = 1;
pub const MOOD_MAX: u8 = 5;

/// Window used by [`MoodLedger::insights`].
pub const INSIGHTS_WINDOW_DAYS: u32 = 30;

/// Half-over-half change in mean mood needed to call a trend.
const TREND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub value: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calendar day of mood samples.
///
/// A day without samples has `average == 0.0` and no entries. That zero is a
/// placeholder, not a mood; check `entries.is_empty()` before using it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMood {
    pub date: NaiveDate,
    pub average: f64,
    pub entries: Vec<MoodEntry>,
}

impl DailyMood {
    pub fn is_tracked(&self) -> bool {
        !self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodInsights {
    pub average_mood: Option<f64>,
    pub trend: Trend,
    /// Highest-average tracked day; first one wins on ties.
    pub best_day: Option<DailyMood>,
    /// Lowest-average tracked day; first one wins on ties.
    pub worst_day: Option<DailyMood>,
    /// Mean of (max - min) over tracked days.
    pub mood_variability: Option<f64>,
    pub total_entries: usize,
    pub days_tracked: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MoodLedger {
    entries: Vec<MoodEntry>,
}

impl Ledger for MoodLedger {
    type Item = MoodEntry;
    const KEY: &'static str = keys::MOOD_ENTRIES;
    const LABEL: &'static str = "mood data";

    fn from_items(entries: Vec<MoodEntry>) -> Self {
        Self { entries }
    }

    fn items(&self) -> &[MoodEntry] {
        &self.entries
    }

    fn replace_items(&mut self, entries: Vec<MoodEntry>) -> Vec<MoodEntry> {
        std::mem::replace(&mut self.entries, entries)
    }

    fn validate(items: &[MoodEntry]) -> std::result::Result<(), String> {
        match items.iter().position(|e| !(MOOD_MIN..=MOOD_MAX).contains(&e.value)) {
            Some(i) => Err(format!(
                "entry {i}: value {} outside {MOOD_MIN}..={MOOD_MAX}",
                items[i].value
            )),
            None => Ok(()),
        }
    }
}

impl MoodLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    /// Append a sample stamped at `at`. Values outside 1..=5 are rejected.
    pub fn add_entry(
        &mut self,
        value: u8,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<&MoodEntry> {
        check_range("mood", value, MOOD_MIN, MOOD_MAX)?;
        self.entries.push(MoodEntry {
            timestamp: at.timestamp_millis(),
            value,
            note,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Entries with `timestamp >= now - days`, oldest first.
    pub fn window_at(&self, now: DateTime<Utc>, days: u32) -> Vec<&MoodEntry> {
        let cutoff = now.timestamp_millis() - i64::from(days) * DAY_MS;
        let mut out: Vec<&MoodEntry> = self
            .entries
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect();
        out.sort_by_key(|e| e.timestamp);
        out
    }

    pub fn average_over_window(&self, days: u32) -> Option<f64> {
        self.average_over_window_at(Utc::now(), days)
    }

    /// Mean value inside the window, `None` when the window is empty.
    pub fn average_over_window_at(&self, now: DateTime<Utc>, days: u32) -> Option<f64> {
        mean(self.window_at(now, days).into_iter())
    }

    pub fn trend_over_window(&self, days: u32) -> Trend {
        self.trend_over_window_at(Utc::now(), days)
    }

    /// Compare the later half of the window against the earlier half.
    /// With an odd count the extra entry goes to the later half.
    pub fn trend_over_window_at(&self, now: DateTime<Utc>, days: u32) -> Trend {
        let window = self.window_at(now, days);
        if window.len() < 2 {
            return Trend::Stable;
        }
        let (first, second) = window.split_at(window.len() / 2);
        let (Some(a), Some(b)) = (
            mean(first.iter().copied()),
            mean(second.iter().copied()),
        ) else {
            return Trend::Stable;
        };
        let diff = b - a;
        if diff > TREND_THRESHOLD {
            Trend::Improving
        } else if diff < -TREND_THRESHOLD {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    pub fn daily_averages(&self, days: u32) -> Vec<DailyMood> {
        self.daily_averages_at(Utc::now(), days)
    }

    /// One bucket per day for the `days` days ending today, oldest first.
    pub fn daily_averages_at(&self, now: DateTime<Utc>, days: u32) -> Vec<DailyMood> {
        let today = now.date_naive();
        (0..u64::from(days))
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|date| {
                let (start, end) = day_bounds_ms(date);
                let entries: Vec<MoodEntry> = self
                    .entries
                    .iter()
                    .filter(|e| e.timestamp >= start && e.timestamp <= end)
                    .cloned()
                    .collect();
                let average = mean(entries.iter()).unwrap_or(0.0);
                DailyMood {
                    date,
                    average,
                    entries,
                }
            })
            .collect()
    }

    pub fn insights(&self) -> MoodInsights {
        self.insights_at(Utc::now())
    }

    pub fn insights_at(&self, now: DateTime<Utc>) -> MoodInsights {
        let days = self.daily_averages_at(now, INSIGHTS_WINDOW_DAYS);
        let tracked: Vec<&DailyMood> = days.iter().filter(|d| d.is_tracked()).collect();

        let mut best: Option<&DailyMood> = None;
        let mut worst: Option<&DailyMood> = None;
        for &day in &tracked {
            if best.is_none_or(|b| day.average > b.average) {
                best = Some(day);
            }
            if worst.is_none_or(|w| day.average < w.average) {
                worst = Some(day);
            }
        }

        let mood_variability = if tracked.is_empty() {
            None
        } else {
            let spread: f64 = tracked
                .iter()
                .map(|d| {
                    let max = d.entries.iter().map(|e| e.value).max().unwrap_or(0);
                    let min = d.entries.iter().map(|e| e.value).min().unwrap_or(0);
                    f64::from(max - min)
                })
                .sum();
            Some(spread / tracked.len() as f64)
        };

        MoodInsights {
            average_mood: self.average_over_window_at(now, INSIGHTS_WINDOW_DAYS),
            trend: self.trend_over_window_at(now, INSIGHTS_WINDOW_DAYS),
            best_day: best.cloned(),
            worst_day: worst.cloned(),
            mood_variability,
            total_entries: self.entries.len(),
            days_tracked: tracked.len(),
        }
    }
}

fn mean<'a>(entries: impl Iterator<Item = &'a MoodEntry>) -> Option<f64> {
    let (sum, n) = entries.fold((0u64, 0u64), |(s, n), e| (s + u64::from(e.value), n + 1));
    (n > 0).then(|| sum as f64 / n as f64)
}
