// tests/mood_tests.rs
// Mood ledger analytics: windows, trend halves, daily buckets, insights.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use haven_core::StoreError;
use haven_core::services::{Ledger, MoodEntry, MoodLedger, Trend};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 15, 18, 0, 0).unwrap()
}

/// One entry per day, the last one a day before `now`.
fn spread_over_week(values: &[u8]) -> MoodLedger {
    let mut ledger = MoodLedger::new();
    let n = values.len() as i64;
    for (i, v) in values.iter().enumerate() {
        let at = now() - Duration::days(n - i as i64);
        ledger.add_entry(*v, None, at).unwrap();
    }
    ledger
}

#[test]
fn rising_week_is_improving() {
    let ledger = spread_over_week(&[1, 1, 1, 5, 5, 5]);
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Improving);
}

#[test]
fn falling_week_is_declining() {
    let ledger = spread_over_week(&[5, 5, 5, 1, 1, 1]);
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Declining);
}

#[test]
fn single_entry_is_stable() {
    let ledger = spread_over_week(&[4]);
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Stable);
    assert_eq!(MoodLedger::new().trend_over_window_at(now(), 7), Trend::Stable);
}

#[test]
fn small_changes_are_stable() {
    let ledger = spread_over_week(&[3, 3, 3, 3]);
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Stable);
}

#[test]
fn odd_counts_give_the_extra_entry_to_the_later_half() {
    // earlier half = [1], later half = [2, 2] -> +1.0
    let ledger = spread_over_week(&[1, 2, 2]);
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Improving);
    // earlier half = [5], later half = [1, 3] -> -3.0
    let ledger = spread_over_week(&[5, 1, 3]);
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Declining);
}

#[test]
fn trend_sorts_by_timestamp_not_insertion() {
    let mut ledger = MoodLedger::new();
    ledger.add_entry(5, None, now() - Duration::days(1)).unwrap();
    ledger.add_entry(1, None, now() - Duration::days(3)).unwrap();
    assert_eq!(ledger.trend_over_window_at(now(), 7), Trend::Improving);
}

#[test]
fn average_ignores_entries_outside_the_window() {
    let mut ledger = MoodLedger::new();
    ledger.add_entry(1, None, now() - Duration::days(10)).unwrap();
    ledger.add_entry(4, None, now() - Duration::days(2)).unwrap();
    ledger.add_entry(5, None, now() - Duration::hours(1)).unwrap();

    assert_eq!(ledger.average_over_window_at(now(), 7), Some(4.5));
    assert_eq!(ledger.average_over_window_at(now(), 30), Some(10.0 / 3.0));
}

#[test]
fn empty_window_average_is_none() {
    let mut ledger = MoodLedger::new();
    assert_eq!(ledger.average_over_window_at(now(), 7), None);
    ledger.add_entry(3, None, now() - Duration::days(9)).unwrap();
    assert_eq!(ledger.average_over_window_at(now(), 7), None);
}

#[test]
fn daily_averages_cover_every_day_oldest_first() {
    let mut ledger = MoodLedger::new();
    ledger.add_entry(2, None, now() - Duration::hours(2)).unwrap();
    ledger.add_entry(4, None, now() - Duration::hours(1)).unwrap();
    ledger.add_entry(5, Some("walk".into()), now() - Duration::days(3)).unwrap();

    let days = ledger.daily_averages_at(now(), 7);
    assert_eq!(days.len(), 7);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 9).unwrap());
    assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());

    assert_eq!(days[6].average, 3.0);
    assert_eq!(days[6].entries.len(), 2);
    assert_eq!(days[3].average, 5.0);
    assert_eq!(days[3].entries[0].note.as_deref(), Some("walk"));
}

#[test]
fn untracked_day_has_zero_average_and_no_entries() {
    let ledger = spread_over_week(&[3]);
    let days = ledger.daily_averages_at(now(), 7);
    let today = days.last().unwrap();
    assert_eq!(today.average, 0.0);
    assert!(today.entries.is_empty());
    assert!(!today.is_tracked());
}

#[test]
fn insights_pick_best_worst_and_variability() {
    let mut ledger = MoodLedger::new();
    let d = |days: i64| now() - Duration::days(days);
    // day -4: 2 and 4 (avg 3, spread 2)
    ledger.add_entry(2, None, d(4)).unwrap();
    ledger.add_entry(4, None, d(4) + Duration::minutes(5)).unwrap();
    // day -2: 5 (avg 5, spread 0)
    ledger.add_entry(5, None, d(2)).unwrap();
    // day -1: 1 (avg 1, spread 0)
    ledger.add_entry(1, None, d(1)).unwrap();
    // outside the 30-day window, still counted in total_entries
    ledger.add_entry(3, None, d(40)).unwrap();

    let insights = ledger.insights_at(now());
    assert_eq!(insights.total_entries, 5);
    assert_eq!(insights.days_tracked, 3);
    assert_eq!(insights.average_mood, Some(3.0));
    assert_eq!(insights.best_day.as_ref().map(|b| b.average), Some(5.0));
    assert_eq!(insights.worst_day.as_ref().map(|w| w.average), Some(1.0));
    assert_eq!(insights.mood_variability, Some(2.0 / 3.0));
}

#[test]
fn insights_ties_go_to_the_earliest_day() {
    let mut ledger = MoodLedger::new();
    ledger.add_entry(4, None, now() - Duration::days(5)).unwrap();
    ledger.add_entry(4, None, now() - Duration::days(2)).unwrap();

    let insights = ledger.insights_at(now());
    let earliest = NaiveDate::from_ymd_opt(2026, 10, 10).unwrap();
    assert_eq!(insights.best_day.unwrap().date, earliest);
    assert_eq!(insights.worst_day.unwrap().date, earliest);
}

#[test]
fn insights_on_an_empty_ledger() {
    let insights = MoodLedger::new().insights_at(now());
    assert_eq!(insights.average_mood, None);
    assert_eq!(insights.trend, Trend::Stable);
    assert!(insights.best_day.is_none());
    assert!(insights.worst_day.is_none());
    assert_eq!(insights.mood_variability, None);
    assert_eq!(insights.days_tracked, 0);
}

#[test]
fn out_of_scale_values_are_rejected() {
    let mut ledger = MoodLedger::new();
    for bad in [0u8, 6, 200] {
        let err = ledger.add_entry(bad, None, now()).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { .. }));
    }
    assert!(ledger.is_empty());
}

#[test]
fn export_then_import_keeps_order() {
    let source = spread_over_week(&[3, 1, 4, 1, 5]);
    let json = source.export().unwrap();
    assert!(json.starts_with("[\n  {"), "expected 2-space pretty JSON: {json}");

    let mut target = MoodLedger::new();
    assert_eq!(target.import(&json).unwrap(), 5);
    assert_eq!(target.entries(), source.entries());
}

#[test]
fn malformed_import_fails_and_keeps_entries() {
    let mut ledger = spread_over_week(&[2, 3]);
    let before: Vec<MoodEntry> = ledger.entries().to_vec();

    for payload in [
        "{not json",
        r#"{"timestamp": 1, "value": 3}"#,
        r#"[{"timestamp": 1}]"#,
        r#"[{"timestamp": 1, "value": 9}]"#,
    ] {
        let err = ledger.import(payload).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }), "{payload}: {err:?}");
        assert_eq!(ledger.entries(), before.as_slice());
    }
}
