// tests/chat_tests.rs

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use haven_core::StoreError;
use haven_core::services::{ChatLedger, Ledger, Role};

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, min, 0).unwrap()
}

fn conversation() -> ChatLedger {
    let mut chat = ChatLedger::new();
    chat.add_message(Role::System, "You are a supportive listener.", at(14, 23, 58));
    chat.add_message(Role::User, "I couldn't sleep again", at(15, 0, 5));
    chat.add_message(Role::Assistant, "That sounds exhausting. What kept you up?", at(15, 0, 6));
    chat.add_message(Role::User, "Worrying about SLEEP, mostly", at(15, 9, 0));
    chat
}

#[test]
fn messages_keep_append_order_and_roles() {
    let chat = conversation();
    let roles: Vec<Role> = chat.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    assert_eq!(chat.messages()[1].timestamp, at(15, 0, 5).timestamp_millis());
}

#[test]
fn by_date_uses_calendar_day_bounds() {
    let chat = conversation();
    assert_eq!(chat.by_date(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()).len(), 1);
    assert_eq!(chat.by_date(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()).len(), 3);
    assert!(chat.by_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()).is_empty());
}

#[test]
fn between_is_inclusive() {
    let chat = conversation();
    assert_eq!(chat.between(at(15, 0, 5), at(15, 0, 6)).len(), 2);
}

#[test]
fn search_ignores_case() {
    let chat = conversation();
    let hits: Vec<&str> = chat.search("sleep").iter().map(|m| m.content.as_str()).collect();
    assert_eq!(hits, vec!["I couldn't sleep again", "Worrying about SLEEP, mostly"]);
}

#[test]
fn roles_serialize_lowercase() {
    let chat = conversation();
    let json = chat.export().unwrap();
    assert!(json.contains(r#""role": "assistant""#), "{json}");
    assert_eq!("system".parse::<Role>().unwrap(), Role::System);
    assert!("moderator".parse::<Role>().is_err());
}

#[test]
fn export_import_round_trip_and_clear() {
    let source = conversation();
    let mut target = ChatLedger::new();
    target.import(&source.export().unwrap()).unwrap();
    assert_eq!(target.messages(), source.messages());

    target.clear();
    assert!(target.is_empty());
}

#[test]
fn unknown_role_or_bad_json_is_invalid_format() {
    let mut chat = conversation();
    for payload in [
        "{not json",
        r#"[{"role": "moderator", "content": "hi", "timestamp": 1}]"#,
        r#"[{"role": "user", "content": "hi"}]"#,
    ] {
        let err = chat.import(payload).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }), "{payload}: {err:?}");
    }
    assert_eq!(chat.len(), 4);
}
