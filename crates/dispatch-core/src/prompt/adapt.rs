//! Conversion of domain messages into the provider's chat message schema.

use serde::{Deserialize, Serialize};

use crate::chat::{Message, Role};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRole {
    System,
    User,
    Assistant,
}

impl From<Role> for CompletionRole {
    fn from(role: Role) -> Self {
        match role {
            Role::System => CompletionRole::System,
            Role::Human => CompletionRole::User,
            Role::AI => CompletionRole::Assistant,
        }
    }
}

/// A chat message in OpenAI-compatible shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionMessage {
    pub role: CompletionRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for CompletionMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.into(),
            content: message.content.clone(),
        }
    }
}

/// Adapt messages for the provider, dropping caller-side identifiers.
pub fn adapt_messages(messages: &[Message]) -> Vec<CompletionMessage> {
    messages.iter().map(CompletionMessage::from).collect()
}
