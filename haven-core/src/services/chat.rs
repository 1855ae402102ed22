// src/services/chat.rs
//! Chat history ledger: a role-tagged, append-only message log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::services::ledger::{Ledger, day_bounds_ms};
use crate::services::store::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(format!("unknown role `{other}` (expected user|assistant|system)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ChatLedger {
    messages: Vec<ChatMessage>,
}

impl Ledger for ChatLedger {
    type Item = ChatMessage;
    const KEY: &'static str = keys::CHAT_HISTORY;
    const LABEL: &'static str = "chat history data";

    fn from_items(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    fn items(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn replace_items(&mut self, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        std::mem::replace(&mut self.messages, messages)
    }
}

impl ChatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn add_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        at: DateTime<Utc>,
    ) -> &ChatMessage {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: at.timestamp_millis(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Messages sent on `day` (UTC).
    pub fn by_date(&self, day: NaiveDate) -> Vec<&ChatMessage> {
        let (start, end) = day_bounds_ms(day);
        self.between_ms(start, end)
    }

    /// Messages with `start <= timestamp <= end`.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&ChatMessage> {
        self.between_ms(start.timestamp_millis(), end.timestamp_millis())
    }

    fn between_ms(&self, start: i64, end: i64) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .collect()
    }

    /// Case-insensitive substring match on content.
    pub fn search(&self, query: &str) -> Vec<&ChatMessage> {
        let needle = query.to_lowercase();
        self.messages
            .iter()
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .collect()
    }
}
