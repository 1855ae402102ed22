// src/utils/logbook.rs
//! Append-only JSONL action log.
//!
//! One line per ledger mutation. Content is never written in full: only a
//! single-line preview capped at `preview_len` characters.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::{fs, io::Write};

use crate::config::LogbookConfig;

#[derive(Serialize)]
struct LogLine<'a> {
    timestamp: String,
    agent: &'a str,
    action: &'a str,
    severity: &'a str,
    details: &'a Value,
}

#[derive(Debug, Clone)]
pub struct Logbook {
    path: Option<PathBuf>,
    preview_len: usize,
}

impl Logbook {
    pub fn open(path: impl Into<PathBuf>, preview_len: usize) -> Self {
        Self {
            path: Some(path.into()),
            preview_len,
        }
    }

    /// A logbook that drops everything.
    pub fn disabled() -> Self {
        Self {
            path: None,
            preview_len: 0,
        }
    }

    pub fn from_config(cfg: &LogbookConfig) -> Self {
        if cfg.enabled {
            Self::open(cfg.path.clone(), cfg.preview_len)
        } else {
            Self::disabled()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an action. Write failures are reported through `tracing` only.
    pub fn record(&self, agent: &str, action: &str, details: &Value, severity: &str) {
        let Some(path) = &self.path else { return };
        let line = LogLine {
            timestamp: Utc::now().to_rfc3339(),
            agent,
            action,
            severity,
            details,
        };
        if let Err(e) = append_jsonl(path, &line) {
            tracing::warn!(path = %path.display(), error = %e, "logbook write failed");
        }
    }

    /// Single-line preview: newlines flattened, truncated with an ellipsis.
    pub fn preview(&self, s: &str) -> String {
        let flat = s.replace(['\n', '\r'], " ");
        if flat.chars().count() <= self.preview_len {
            return flat;
        }
        let mut t: String = flat.chars().take(self.preview_len).collect();
        t.push('…');
        t
    }
}

fn append_jsonl<S: Serialize>(path: &Path, val: &S) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(val)?;
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{}", json)?;
    Ok(())
}
