// src/services/report.rs
//! Weekly digest over the mood and journal ledgers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::services::journal::JournalLedger;
use crate::services::ledger::DAY_MS;
use crate::services::mood::{DailyMood, MoodLedger, Trend};

pub const REPORT_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub week_ending: NaiveDate,
    pub weekly_trends: Vec<DailyMood>,
    pub average_mood: Option<f64>,
    pub trend: Trend,
    /// Most frequent journal tags of the week.
    pub common_tags: Vec<TagCount>,
    pub journal_entries: usize,
    pub mood_entries: usize,
}

impl WeeklyReport {
    pub fn build(
        mood: &MoodLedger,
        journal: &JournalLedger,
        now: DateTime<Utc>,
        top_tags: usize,
    ) -> Self {
        let cutoff = now.timestamp_millis() - i64::from(REPORT_WINDOW_DAYS) * DAY_MS;
        let week: Vec<_> = journal
            .entries()
            .iter()
            .filter(|e| e.date.timestamp_millis() >= cutoff)
            .collect();

        let tags = week.iter().flat_map(|e| e.tags.iter().map(String::as_str));

        Self {
            week_ending: now.date_naive(),
            weekly_trends: mood.daily_averages_at(now, REPORT_WINDOW_DAYS),
            average_mood: mood.average_over_window_at(now, REPORT_WINDOW_DAYS),
            trend: mood.trend_over_window_at(now, REPORT_WINDOW_DAYS),
            common_tags: top_counts(tags, top_tags),
            journal_entries: week.len(),
            mood_entries: mood.window_at(now, REPORT_WINDOW_DAYS).len(),
        }
    }
}

/// Count occurrences and keep the `limit` most frequent; ties keep first-seen order.
fn top_counts<'a>(items: impl Iterator<Item = &'a str>, limit: usize) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|c| c.tag == item) {
            Some(c) => c.count += 1,
            None => counts.push(TagCount {
                tag: item.to_string(),
                count: 1,
            }),
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
