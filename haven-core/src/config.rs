use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl CoreConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            Self::from_toml(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str::<CoreConfig>(text)?)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.storage.path = Some(absolutize(root, &self.storage.path()));
        self.logbook.path = absolutize(root, &self.logbook.path);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "SystemConfig::default_name")]
    pub name: String,
    #[serde(default = "SystemConfig::default_version")]
    pub version: String,
}

impl SystemConfig {
    fn default_name() -> String {
        "haven".to_string()
    }

    fn default_version() -> String {
        "0.1.0".to_string()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            version: Self::default_version(),
        }
    }
}

// -------------------------------------------------------------------------
// Storage
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Sqlite,
    File,
    Memory, // nothing survives the process
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::File => "file",
            BackendKind::Memory => "memory",
        }
    }

    fn default_path(&self) -> PathBuf {
        match self {
            BackendKind::Sqlite => PathBuf::from("data/haven.db"),
            BackendKind::File | BackendKind::Memory => PathBuf::from("data/kv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Database file (sqlite) or directory (file). Defaults depend on `backend`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Upper bound on stored bytes; 0 disables the check.
    #[serde(default = "StorageConfig::default_capacity_bytes")]
    pub capacity_bytes: u64,
}

impl StorageConfig {
    fn default_capacity_bytes() -> u64 {
        5 * 1024 * 1024
    }

    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| self.backend.default_path())
    }

    pub fn capacity(&self) -> Option<u64> {
        (self.capacity_bytes > 0).then_some(self.capacity_bytes)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            capacity_bytes: Self::default_capacity_bytes(),
        }
    }
}

// -------------------------------------------------------------------------
// Logbook / report
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "LogbookConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "LogbookConfig::default_preview_len")]
    pub preview_len: usize,
}

impl LogbookConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_path() -> PathBuf {
        PathBuf::from("logbook/actions.jsonl")
    }

    fn default_preview_len() -> usize {
        120
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            path: Self::default_path(),
            preview_len: Self::default_preview_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "ReportConfig::default_top_tags")]
    pub top_tags: usize,
}

impl ReportConfig {
    fn default_top_tags() -> usize {
        3
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_tags: Self::default_top_tags(),
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}
