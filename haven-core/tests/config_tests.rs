// tests/config_tests.rs

use std::fs;

use anyhow::Result;
use tempfile::TempDir;

use haven_core::Haven;
use haven_core::commands::ensure_initialized;
use haven_core::config::{BackendKind, CoreConfig};

#[test]
fn missing_sections_fall_back_to_defaults() -> Result<()> {
    let cfg = CoreConfig::from_toml("[storage]\nbackend = \"file\"\n")?;
    assert_eq!(cfg.storage.backend, BackendKind::File);
    assert_eq!(cfg.storage.capacity(), Some(5 * 1024 * 1024));
    assert!(cfg.logbook.enabled);
    assert_eq!(cfg.logbook.preview_len, 120);
    assert_eq!(cfg.report.top_tags, 3);
    Ok(())
}

#[test]
fn zero_capacity_means_unlimited() -> Result<()> {
    let cfg = CoreConfig::from_toml("[storage]\ncapacity_bytes = 0\n")?;
    assert_eq!(cfg.storage.capacity(), None);
    Ok(())
}

#[test]
fn unknown_backend_is_rejected() {
    assert!(CoreConfig::from_toml("[storage]\nbackend = \"redis\"\n").is_err());
}

#[test]
fn relative_paths_resolve_against_the_root() -> Result<()> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("config.toml"),
        "[storage]\nbackend = \"file\"\n\n[logbook]\nenabled = false\n",
    )?;
    let cfg = CoreConfig::load(tmp.path())?;
    assert_eq!(cfg.storage.path(), tmp.path().join("data").join("kv"));
    assert_eq!(cfg.logbook.path, tmp.path().join("logbook").join("actions.jsonl"));
    Ok(())
}

#[test]
fn open_root_honours_the_configured_backend() -> Result<()> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("config.toml"),
        "[storage]\nbackend = \"file\"\n\n[logbook]\nenabled = false\n",
    )?;

    let (mut haven, _) = Haven::open_root(tmp.path())?;
    haven.set_session_summary("hello")?;
    haven.record_mood(4, None)?;

    let kv = tmp.path().join("data").join("kv");
    assert!(kv.join("sessionSummary.json").is_file());
    assert!(kv.join("moodEntries.json").is_file());
    assert!(!tmp.path().join("logbook").join("actions.jsonl").exists());
    Ok(())
}

#[test]
fn switching_only_the_backend_in_the_default_config_moves_the_path() -> Result<()> {
    let tmp = TempDir::new()?;
    ensure_initialized(tmp.path())?;

    let cfg = CoreConfig::load(tmp.path())?;
    assert_eq!(cfg.storage.backend, BackendKind::Sqlite);
    assert_eq!(cfg.storage.path(), tmp.path().join("data").join("haven.db"));

    let path = tmp.path().join("config.toml");
    let text = fs::read_to_string(&path)?;
    assert!(text.contains("backend = \"sqlite\""));
    fs::write(&path, text.replace("backend = \"sqlite\"", "backend = \"file\""))?;

    let cfg = CoreConfig::load(tmp.path())?;
    assert_eq!(cfg.storage.backend, BackendKind::File);
    assert_eq!(cfg.storage.path(), tmp.path().join("data").join("kv"));
    Ok(())
}
