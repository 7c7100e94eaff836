//! The live channel that partial answers are pushed to.

use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

/// Event name used for answer increments in detail mode.
pub const ANSWER_EVENT: &str = "answer";

/// One self-describing event for the live client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub data: String,
}

impl LiveEvent {
    /// An answer increment, named `answer` in detail mode and unnamed otherwise.
    pub fn answer(text: &str, detail: bool) -> Self {
        Self {
            event: detail.then(|| ANSWER_EVENT.to_string()),
            data: text_adapt_gpt_response(text),
        }
    }

    /// `event: <name>\ndata: <data>\n\n`
    pub fn to_sse_frame(&self) -> String {
        match &self.event {
            Some(event) => format!("event: {}\ndata: {}\n\n", event, self.data),
            None => format!("data: {}\n\n", self.data),
        }
    }

    #[cfg(test)]
    pub(crate) fn delta_text(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.data).ok()?;
        value["choices"][0]["delta"]["content"]
            .as_str()
            .map(str::to_string)
    }
}

/// Wrap text in a chat-completion-chunk shaped document so clients that
/// already speak the OpenAI stream format can consume it unchanged.
pub fn text_adapt_gpt_response(text: &str) -> String {
    json!({
        "id": "",
        "object": "",
        "created": 0,
        "model": "",
        "choices": [{
            "delta": { "role": "assistant", "content": text },
            "index": 0,
            "finish_reason": null
        }]
    })
    .to_string()
}

/// Downstream sink for answer increments.
///
/// `push` must not block. `is_closed` turns true once the client is gone.
pub trait LiveChannel: Send + Sync {
    fn push(&self, event: LiveEvent);

    fn is_closed(&self) -> bool;
}

/// Live channel over an unbounded mpsc queue; closed when the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LiveEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LiveEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LiveChannel for ChannelSink {
    fn push(&self, event: LiveEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Live channel receiver dropped, discarding event");
        }
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A channel with no client behind it, for batch callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl LiveChannel for NullChannel {
    fn push(&self, _event: LiveEvent) {}

    fn is_closed(&self) -> bool {
        false
    }
}
