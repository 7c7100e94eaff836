pub mod adapt;
pub mod assembler;
pub mod template;

pub use adapt::{adapt_messages, CompletionMessage, CompletionRole};
pub use assembler::{assemble_prompt, AssembledPrompt, PromptInput};
pub use template::{DEFAULT_QUOTE_PROMPT, DEFAULT_QUOTE_TEMPLATE};
