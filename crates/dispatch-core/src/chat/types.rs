use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    System,
    Human,
    AI,
}

/// One entry of a conversation.
///
/// `data_id` is a caller-side identifier (e.g. a stored chat item id). It is
/// carried through budgeting and previews but never sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            data_id: None,
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            data_id: None,
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            data_id: None,
            role: Role::AI,
            content: content.into(),
        }
    }

    pub fn with_data_id(mut self, data_id: impl Into<String>) -> Self {
        self.data_id = Some(data_id.into());
        self
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// A retrieved reference passage.
///
/// The fields are opaque to the dispatcher: whatever the retrieval step
/// produced (`q`, `a`, `source`, ...) is available to the quote template as
/// `{{field}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuoteItem {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl QuoteItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Field value as template text. Strings are inserted raw, anything else as JSON.
    pub fn field_text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}
