// tests/store_tests.rs
// Versioned store: envelopes, missing keys, corruption, quota, backup/restore.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};

use haven_core::StoreError;
use haven_core::backend::{MemoryBackend, StorageBackend};
use haven_core::services::store::{STORAGE_VERSION, StorageEnvelope, VersionedStore, keys};
use haven_core::utils::{Clock, FixedClock};

fn fixed_store() -> (VersionedStore<MemoryBackend>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap(),
    ));
    let store = VersionedStore::with_clock(MemoryBackend::new(), clock.clone());
    (store, clock)
}

#[test]
fn set_then_get_returns_the_same_value() {
    let (store, _) = fixed_store();
    let value = json!({ "a": [1, 2, 3], "b": { "nested": true }, "c": null });
    store.set("thing", &value).unwrap();
    let got: Option<Value> = store.get("thing").unwrap();
    assert_eq!(got, Some(value));
}

#[test]
fn writes_are_wrapped_in_an_envelope() {
    let (store, clock) = fixed_store();
    store.set(keys::SESSION_SUMMARY, "felt calmer today").unwrap();

    let raw = store.backend().get_item(keys::SESSION_SUMMARY).unwrap().expect("raw");
    let env: StorageEnvelope<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(env.value, "felt calmer today");
    assert_eq!(env.version, STORAGE_VERSION);
    assert_eq!(env.timestamp, clock.now_ms());
}

#[test]
fn missing_key_is_none_not_an_error() {
    let (store, _) = fixed_store();
    assert_eq!(store.get::<Value>("nope").unwrap(), None);
    assert_eq!(store.get_timestamp("nope").unwrap(), None);
    assert!(!store.exists("nope").unwrap());
}

#[test]
fn malformed_envelope_is_storage_corruption() {
    let (store, _) = fixed_store();
    store.backend().set_item(keys::MOOD_ENTRIES, "{not json").unwrap();

    let err = store.get::<Value>(keys::MOOD_ENTRIES).unwrap_err();
    assert!(
        matches!(err, StoreError::StorageCorruption { ref key, .. } if key == keys::MOOD_ENTRIES),
        "unexpected error: {err:?}"
    );
    assert!(matches!(
        store.get_timestamp(keys::MOOD_ENTRIES),
        Err(StoreError::StorageCorruption { .. })
    ));
}

#[test]
fn value_of_the_wrong_shape_is_storage_corruption() {
    let (store, _) = fixed_store();
    store.set("count", &"not a number").unwrap();
    assert!(matches!(
        store.get::<u32>("count"),
        Err(StoreError::StorageCorruption { .. })
    ));
}

#[test]
fn other_versions_are_read_as_is() {
    let (store, _) = fixed_store();
    store
        .backend()
        .set_item("legacy", r#"{"value":[1,2],"timestamp":5,"version":"0.9.0"}"#)
        .unwrap();
    let env = store.get_envelope::<Vec<u8>>("legacy").unwrap().unwrap();
    assert_eq!(env.value, vec![1, 2]);
    assert_eq!(env.version, "0.9.0");
}

#[test]
fn remove_twice_is_the_same_as_once() {
    let (store, _) = fixed_store();
    store.set("k", &1).unwrap();
    store.remove("k").unwrap();
    store.remove("k").unwrap();
    assert_eq!(store.get::<i32>("k").unwrap(), None);
}

#[test]
fn update_sees_previous_value() {
    let (store, _) = fixed_store();
    let first = store.update("counter", |prev: Option<u32>| prev.unwrap_or(0) + 1).unwrap();
    let second = store.update("counter", |prev: Option<u32>| prev.unwrap_or(0) + 1).unwrap();
    assert_eq!((first, second), (1, 2));
    assert_eq!(store.get::<u32>("counter").unwrap(), Some(2));
}

#[test]
fn timestamp_tracks_the_last_write() {
    let (store, clock) = fixed_store();
    store.set("k", &"a").unwrap();
    let t1 = store.get_timestamp("k").unwrap().unwrap();
    clock.advance(Duration::seconds(90));
    store.set("k", &"b").unwrap();
    let t2 = store.get_timestamp("k").unwrap().unwrap();
    assert_eq!(t2 - t1, 90_000);
}

#[test]
fn quota_exceeded_propagates_and_keeps_previous_value() {
    let store = VersionedStore::new(MemoryBackend::with_capacity(Some(128)));
    store.set("small", &"ok").unwrap();

    let big = "x".repeat(512);
    let err = store.set("small", &big).unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { .. }), "got {err:?}");
    assert_eq!(store.get::<String>("small").unwrap().as_deref(), Some("ok"));
}

#[test]
fn restore_of_backup_reproduces_the_namespace() {
    let (store, clock) = fixed_store();
    store.set(keys::MOOD_ENTRIES, &json!([{ "timestamp": 1, "value": 3 }])).unwrap();
    store.set(keys::SESSION_SUMMARY, "summary").unwrap();
    store.set(keys::USER_PREFERENCES, &json!({ "theme": "dark" })).unwrap();
    let before = store.get_all().unwrap();

    let snapshot = store.backup().unwrap();
    clock.advance(Duration::minutes(5));
    let restored = store.restore(&snapshot).unwrap();

    assert_eq!(restored, 3);
    assert_eq!(store.keys().unwrap(), before.keys().cloned().collect::<Vec<_>>());
    assert_eq!(store.get_all().unwrap(), before);
}

#[test]
fn restore_clears_keys_missing_from_the_snapshot() {
    let (store, _) = fixed_store();
    store.set("keep", &1).unwrap();
    let snapshot = store.backup().unwrap();
    store.set("extra", &2).unwrap();

    store.restore(&snapshot).unwrap();
    assert_eq!(store.keys().unwrap(), vec!["keep".to_string()]);
}

#[test]
fn malformed_snapshot_is_invalid_format_and_touches_nothing() {
    let (store, _) = fixed_store();
    store.set("keep", &1).unwrap();

    let err = store.restore("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, StoreError::InvalidFormat { .. }), "got {err:?}");
    assert_eq!(store.get::<i32>("keep").unwrap(), Some(1));
}
