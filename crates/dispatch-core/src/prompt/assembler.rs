//! Prompt assembly.
//!
//! Builds `System(systemPrompt) → history → System(limitPrompt) → Human(question)`,
//! runs it through the context filter and adapts the survivors for the provider.

use crate::budget::counter::TokenCounter;
use crate::budget::filter::{filter_context, CONTEXT_SAFETY_MARGIN};
use crate::budget::types::BudgetError;
use crate::chat::Message;
use crate::model::ModelCapabilities;
use crate::prompt::adapt::{adapt_messages, CompletionMessage};
use crate::prompt::template::{render_quote_prompt, DEFAULT_QUOTE_PROMPT};

/// Inputs to [`assemble_prompt`]. Empty strings mean "absent".
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub system_prompt: &'a str,
    pub history: &'a [Message],
    /// Rendered quotes from [`crate::budget::fit_quotes`]
    pub quote_text: &'a str,
    pub quote_prompt: Option<&'a str>,
    pub limit_prompt: Option<&'a str>,
    pub question: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    /// Provider-shaped messages for the completion call
    pub messages: Vec<CompletionMessage>,
    /// The same messages in domain form, used for usage accounting
    pub filtered: Vec<Message>,
}

/// Final question text: the raw question, or the quote prompt wrapped around it when quotes exist.
pub fn render_question(input: &PromptInput<'_>) -> String {
    if input.quote_text.is_empty() {
        return input.question.to_string();
    }

    let quote_prompt = input
        .quote_prompt
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_QUOTE_PROMPT);
    render_quote_prompt(quote_prompt, input.quote_text, input.question)
}

pub fn assemble_prompt(
    input: &PromptInput<'_>,
    capabilities: &ModelCapabilities,
    counter: &dyn TokenCounter,
) -> Result<AssembledPrompt, BudgetError> {
    let question = render_question(input);

    let mut candidate = Vec::with_capacity(input.history.len() + 3);
    if !input.system_prompt.is_empty() {
        candidate.push(Message::system(input.system_prompt));
    }
    candidate.extend(input.history.iter().cloned());
    if let Some(limit_prompt) = input.limit_prompt.filter(|p| !p.is_empty()) {
        candidate.push(Message::system(limit_prompt));
    }
    candidate.push(Message::human(question));

    let max_tokens = capabilities
        .context_max_token
        .saturating_sub(CONTEXT_SAFETY_MARGIN);
    let filtered = filter_context(candidate, max_tokens, counter)?;

    Ok(AssembledPrompt {
        messages: adapt_messages(&filtered),
        filtered,
    })
}
