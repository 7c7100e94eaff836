pub mod budget;
pub mod chat;
pub mod model;
pub mod prompt;
pub mod usage;

pub use budget::{
    filter_context, fit_quotes, reserve_response_tokens, BudgetError, HeuristicTokenCounter,
    QuoteSelection, SharedTokenCounter, TokenCounter, CONTEXT_SAFETY_MARGIN,
};
pub use chat::{Message, QuoteItem, Role};
pub use model::{ModelCapabilities, ModelCatalog};
pub use prompt::{
    adapt_messages, assemble_prompt, AssembledPrompt, CompletionMessage, CompletionRole,
    PromptInput, DEFAULT_QUOTE_PROMPT, DEFAULT_QUOTE_TEMPLATE,
};
pub use usage::{
    history_preview, CatalogPricing, CompletedExchange, PriceLookup, UsageRecord, UsageReporter,
};
