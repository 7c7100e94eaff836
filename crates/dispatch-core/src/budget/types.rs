use thiserror::Error;

/// Errors raised when the context window cannot hold what must be sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// The fixed prompt parts (system prompt + question) alone overflow the window
    #[error("Prompt requires {required_tokens} tokens but only {available_tokens} fit in the context window")]
    ContextExhausted {
        required_tokens: u32,
        available_tokens: u32,
    },

    /// Nothing is left for the response after the prompt
    #[error("Prompt uses {prompt_tokens} of {context_max_tokens} context tokens, leaving no room for a response")]
    ResponseBudgetExhausted {
        prompt_tokens: u32,
        context_max_tokens: u32,
    },
}
