use dispatch_core::CompletionMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a chat completion call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// Provider-scale temperature
    pub temperature: f64,
    pub max_tokens: u32,
    pub messages: Vec<CompletionMessage>,
    pub stream: bool,
}

// --- single-shot response ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseChoice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`, or empty.
    pub fn answer(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }

    /// `usage.total_tokens` when the provider reported a non-zero value.
    pub fn total_tokens(&self) -> Option<u32> {
        self.usage
            .and_then(|u| u.total_tokens)
            .filter(|tokens| *tokens > 0)
    }
}

// --- streaming events ---

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// `[DONE]` sentinel
    Done,
    /// Incremental text; `content` is empty for keep-alive or role-only deltas
    Delta {
        content: String,
        finish_reason: Option<String>,
    },
    /// The provider reported an error inside the stream
    Error(String),
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Human-readable message of an `error` payload: `error.message`, the error
/// string itself, or the raw JSON.
pub fn extract_error_message(error: &Value) -> String {
    if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
        return message.to_string();
    }
    if let Some(message) = error.as_str() {
        return message.to_string();
    }
    error.to_string()
}

/// Decode the `data:` payload of one stream event.
///
/// Decoding is lenient: a payload that is not a recognizable chunk becomes an
/// empty delta so the stream keeps flowing.
pub fn parse_stream_event(data: &str) -> StreamEvent {
    let data = data.trim();
    if data == "[DONE]" {
        return StreamEvent::Done;
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Ignoring undecodable stream event ({}): {}", e, data);
            return empty_delta();
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        return StreamEvent::Error(extract_error_message(error));
    }

    match serde_json::from_value::<StreamChunk>(value) {
        Ok(chunk) => {
            let Some(choice) = chunk.choices.into_iter().next() else {
                return empty_delta();
            };
            StreamEvent::Delta {
                content: choice.delta.content.unwrap_or_default(),
                finish_reason: choice.finish_reason,
            }
        }
        Err(e) => {
            log::warn!("Ignoring stream event with unexpected shape: {}", e);
            empty_delta()
        }
    }
}

fn empty_delta() -> StreamEvent {
    StreamEvent::Delta {
        content: String::new(),
        finish_reason: None,
    }
}
