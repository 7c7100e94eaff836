//! Token counting for budget management.
//!
//! The dispatcher treats the tokenizer as a black box behind [`TokenCounter`].
//! [`HeuristicTokenCounter`] is a conservative stand-in (chars/4 + 10% margin)
//! for deployments that do not plug in a real tokenizer.

use crate::chat::Message;
use std::sync::Arc;

/// Trait for token counting implementations.
///
/// Implementations must be deterministic and monotonic: adding messages or
/// characters never lowers the count.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in a single message, including role framing.
    fn count_message(&self, message: &Message) -> u32;

    /// Count tokens in multiple messages.
    fn count_messages(&self, messages: &[Message]) -> u32 {
        messages
            .iter()
            .fold(0u32, |acc, m| acc.saturating_add(self.count_message(m)))
    }

    /// Count tokens in a plain text string.
    fn count_text(&self, text: &str) -> u32;
}

/// Heuristic token counter using character-based estimation.
///
/// Uses the approximation: tokens ≈ characters / 4, with a 10% safety margin
/// plus a fixed overhead for the role wrapper of each chat message.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    /// Characters per token ratio (default: 4)
    chars_per_token: f64,
    /// Safety margin multiplier (default: 1.1 = 10% extra)
    safety_margin: f64,
    /// Role/format overhead per message in tokens
    message_overhead: u32,
}

impl HeuristicTokenCounter {
    pub fn new(chars_per_token: f64, safety_margin: f64, message_overhead: u32) -> Self {
        Self {
            chars_per_token,
            safety_margin,
            message_overhead,
        }
    }

    /// chars/4 + 10% margin + 4 tokens of role framing per message.
    pub fn with_defaults() -> Self {
        Self {
            chars_per_token: 4.0,
            safety_margin: 1.1,
            message_overhead: 4,
        }
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_message(&self, message: &Message) -> u32 {
        self.count_text(&message.content)
            .saturating_add(self.message_overhead)
    }

    fn count_text(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }

        let char_count = text.chars().count() as f64;
        let base_tokens = char_count / self.chars_per_token;
        let adjusted_tokens = base_tokens * self.safety_margin;

        adjusted_tokens.ceil() as u32
    }
}

/// Arc-wrapped token counter for easy sharing.
pub type SharedTokenCounter = Arc<dyn TokenCounter>;
