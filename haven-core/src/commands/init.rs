// haven-core/src/commands/init.rs

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub created: Vec<String>,
    pub existed: Vec<String>,
}

/// Resolve the data root. `HAVEN_ROOT` overrides the default `.haven`.
pub fn haven_root() -> PathBuf {
    std::env::var_os("HAVEN_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".haven"))
}

/// Lay out a data root (idempotent). Safe to call on every start.
pub fn ensure_initialized(root: &Path) -> Result<InitReport> {
    let mut report = InitReport {
        root: root.to_path_buf(),
        created: Vec::new(),
        existed: Vec::new(),
    };
    for dir in [".", "data", "logbook"] {
        report.dir(dir)?;
    }
    report.file("config.toml", DEFAULT_CONFIG_TOML)?;
    if !report.created.is_empty() {
        tracing::info!(root = %root.display(), created = ?report.created, "data root initialized");
    }
    Ok(report)
}

impl InitReport {
    fn note(&mut self, rel: &str, fresh: bool) {
        let list = if fresh { &mut self.created } else { &mut self.existed };
        list.push(rel.to_string());
    }

    fn dir(&mut self, rel: &str) -> Result<()> {
        let p = self.root.join(rel);
        let fresh = !p.is_dir();
        if fresh {
            fs::create_dir_all(&p).with_context(|| format!("creating {}", p.display()))?;
        }
        self.note(rel, fresh);
        Ok(())
    }

    /// Write `default` only when the file is absent; existing files are never touched.
    fn file(&mut self, rel: &str, default: &str) -> Result<()> {
        let p = self.root.join(rel);
        let fresh = !p.exists();
        if fresh {
            write_atomic(&p, default.as_bytes())?;
        }
        self.note(rel, fresh);
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp)
        .with_context(|| format!("opening {}", tmp.display()))?;
    f.write_all(bytes)?;
    f.sync_all()?;
    drop(f);
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))
}

const DEFAULT_CONFIG_TOML: &str = r#"# Haven data root configuration

[system]
name = "haven"
version = "0.1.0"

[storage]
# sqlite | file | memory
backend = "sqlite"
# defaults to data/haven.db for sqlite, data/kv for file
# path = "data/haven.db"
# 0 disables the quota check
capacity_bytes = 5242880

[logbook]
enabled = true
path = "logbook/actions.jsonl"
preview_len = 120

[report]
top_tags = 3
"#;
