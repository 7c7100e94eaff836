//! Token budget arithmetic for prompt assembly.
//!
//! Every content source competes for the same context window: rendered
//! quotes, conversation history, the fixed system/limit prompts and the
//! response reservation. The functions here decide what survives.
//!
//! - [`counter`]: token counting capability plus a heuristic implementation
//! - [`quotes`]: prefix selection of reference passages under a ceiling
//! - [`filter`]: front-trimming of the candidate message sequence
//! - [`reserve`]: response token reservation against the context window

pub mod counter;
pub mod filter;
pub mod quotes;
pub mod reserve;
pub mod types;

pub use counter::{HeuristicTokenCounter, SharedTokenCounter, TokenCounter};
pub use filter::{filter_context, CONTEXT_SAFETY_MARGIN};
pub use quotes::{fit_quotes, QuoteSelection};
pub use reserve::reserve_response_tokens;
pub use types::BudgetError;
