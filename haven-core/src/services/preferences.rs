// src/services/preferences.rs
//! User preferences: a single document, always persisted on change.
//!
//! Stored documents are merged over the defaults field by field, so an older
//! document missing a newer field still loads.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::StorageBackend;
use crate::error::{Result, StoreError};
use crate::services::store::{VersionedStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme `{other}` (expected light|dark)")),
        }
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "small" => Ok(FontSize::Small),
            "medium" => Ok(FontSize::Medium),
            "large" => Ok(FontSize::Large),
            other => Err(format!("unknown font size `{other}` (expected small|medium|large)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub voice_enabled: bool,
    /// When off, ledger changes stay in memory and are not written.
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: FontSize::default(),
            notifications: true,
            voice_enabled: true,
            auto_save: true,
            language: default_language(),
        }
    }
}

/// Partial update; unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub font_size: Option<FontSize>,
    #[serde(default)]
    pub notifications: Option<bool>,
    #[serde(default)]
    pub voice_enabled: Option<bool>,
    #[serde(default)]
    pub auto_save: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
}

impl Preferences {
    /// Stored preferences merged over defaults; defaults when nothing is stored.
    pub fn load<B: StorageBackend>(store: &VersionedStore<B>) -> Result<Self> {
        Ok(store
            .get::<Preferences>(keys::USER_PREFERENCES)?
            .unwrap_or_default())
    }

    pub fn save<B: StorageBackend>(&self, store: &VersionedStore<B>) -> Result<()> {
        store.set(keys::USER_PREFERENCES, self)
    }

    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.font_size {
            self.font_size = v;
        }
        if let Some(v) = patch.notifications {
            self.notifications = v;
        }
        if let Some(v) = patch.voice_enabled {
            self.voice_enabled = v;
        }
        if let Some(v) = patch.auto_save {
            self.auto_save = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
    }

    pub fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(StoreError::Encode)
    }

    /// Decode a (possibly partial) settings document into a patch.
    pub fn parse_patch(json: &str) -> Result<PreferencesPatch> {
        serde_json::from_str(json).map_err(|e| StoreError::invalid_format("preferences", e))
    }
}
