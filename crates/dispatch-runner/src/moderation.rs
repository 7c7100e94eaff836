//! Content moderation capability.
//!
//! Models flagged with `censor` must have their prompt approved before the
//! remote call. The policy lives behind [`Moderator`]; [`KeywordModerator`]
//! is a local keyword/regex block list.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ModerationRejected(pub String);

#[async_trait]
pub trait Moderator: Send + Sync {
    /// Fails when `text` violates the policy.
    async fn moderate(&self, text: &str) -> Result<(), ModerationRejected>;
}

/// Text submitted for moderation: system prompt, rendered quotes and question.
pub fn moderation_text(system_prompt: &str, quote_text: &str, question: &str) -> String {
    format!("{system_prompt}\n{quote_text}\n{question}")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Case-insensitive substring search
    #[default]
    Exact,
    Regex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl KeywordEntry {
    pub fn exact(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_type: MatchType::Exact,
            enabled: true,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_type: MatchType::Regex,
            enabled: true,
        }
    }
}

enum CompiledEntry {
    Exact(String),
    Regex(Regex),
}

/// Rejects text containing any enabled block-list entry.
pub struct KeywordModerator {
    entries: Vec<CompiledEntry>,
}

impl KeywordModerator {
    /// Compile the block list; fails on an invalid regex entry.
    pub fn new(entries: Vec<KeywordEntry>) -> Result<Self, regex::Error> {
        let entries = entries
            .into_iter()
            .filter(|entry| entry.enabled)
            .map(|entry| match entry.match_type {
                MatchType::Exact => Ok(CompiledEntry::Exact(entry.pattern.to_lowercase())),
                MatchType::Regex => Regex::new(&entry.pattern).map(CompiledEntry::Regex),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }
}

#[async_trait]
impl Moderator for KeywordModerator {
    async fn moderate(&self, text: &str) -> Result<(), ModerationRejected> {
        let lowered = text.to_lowercase();
        let hit = self.entries.iter().any(|entry| match entry {
            CompiledEntry::Exact(pattern) => lowered.contains(pattern.as_str()),
            CompiledEntry::Regex(regex) => regex.is_match(text),
        });

        if hit {
            log::warn!("Prompt rejected by keyword moderation");
            return Err(ModerationRejected(
                "The content contains sensitive words and was rejected".to_string(),
            ));
        }
        Ok(())
    }
}
