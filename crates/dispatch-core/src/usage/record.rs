use serde::{Deserialize, Serialize};

use crate::budget::counter::TokenCounter;
use crate::chat::{Message, QuoteItem};
use crate::model::ModelCapabilities;
use crate::usage::pricing::PriceLookup;

/// Module type tag carried by every chat usage record.
pub const CHAT_MODULE_TYPE: &str = "chatNode";

const PREVIEW_CHARS: usize = 15;
const PREVIEW_MARKER: &str = "...";

/// Billing/audit record for a single dispatch. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub module_type: String,
    pub module_name: String,
    pub price: f64,
    pub model: String,
    pub tokens: u32,
    pub question: String,
    /// Response token budget actually sent to the provider
    pub max_token: u32,
    pub quote_list: Vec<QuoteItem>,
    pub history_preview: Vec<Message>,
}

/// Shorten every message except System scaffolding and the final exchange
/// (the last two entries), which stay verbatim.
pub fn history_preview(messages: &[Message]) -> Vec<Message> {
    let keep_from = messages.len().saturating_sub(2);

    messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            if message.is_system() || i >= keep_from {
                return message.clone();
            }

            let mut preview = message.clone();
            if message.content.chars().count() > PREVIEW_CHARS {
                let head: String = message.content.chars().take(PREVIEW_CHARS).collect();
                preview.content = format!("{head}{PREVIEW_MARKER}");
            }
            preview
        })
        .collect()
}

/// Produces [`UsageRecord`]s from a finished exchange.
pub struct UsageReporter<'a> {
    counter: &'a dyn TokenCounter,
    pricing: &'a dyn PriceLookup,
}

/// Everything known about the exchange once the answer is in.
#[derive(Debug, Clone)]
pub struct CompletedExchange<'a> {
    pub module_name: &'a str,
    pub question: &'a str,
    pub filtered: &'a [Message],
    pub answer: &'a str,
    /// Provider-reported total, when the provider sent one
    pub reported_tokens: Option<u32>,
    pub max_token: u32,
    pub quotes: &'a [QuoteItem],
    /// Caller paid with their own credential
    pub own_credential: bool,
}

impl<'a> UsageReporter<'a> {
    pub fn new(counter: &'a dyn TokenCounter, pricing: &'a dyn PriceLookup) -> Self {
        Self { counter, pricing }
    }

    pub fn report(&self, model: &ModelCapabilities, exchange: CompletedExchange<'_>) -> UsageRecord {
        let mut complete = exchange.filtered.to_vec();
        complete.push(Message::ai(exchange.answer));

        let tokens = exchange
            .reported_tokens
            .unwrap_or_else(|| self.counter.count_messages(&complete));

        let price = if exchange.own_credential {
            0.0
        } else {
            self.pricing.price(model, tokens)
        };

        UsageRecord {
            module_type: CHAT_MODULE_TYPE.to_string(),
            module_name: exchange.module_name.to_string(),
            price,
            model: model.name.clone(),
            tokens,
            question: exchange.question.to_string(),
            max_token: exchange.max_token,
            quote_list: exchange.quotes.to_vec(),
            history_preview: history_preview(&complete),
        }
    }
}
