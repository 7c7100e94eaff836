use dispatch_core::BudgetError;
use dispatch_llm::LLMError;
use thiserror::Error;

use crate::moderation::ModerationRejected;

/// Why a dispatch was rejected. No usage record is produced on any of these paths.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Empty question or unknown model; nothing was sent upstream
    #[error("{0}")]
    Validation(String),

    /// Moderation refused the prompt
    #[error("{0}")]
    Policy(String),

    /// The provider failed the call or reported an error mid-stream
    #[error("{0}")]
    Upstream(String),

    /// The context window cannot hold the prompt and a response
    #[error("{0}")]
    Capacity(String),
}

impl From<BudgetError> for DispatchError {
    fn from(err: BudgetError) -> Self {
        DispatchError::Capacity(err.to_string())
    }
}

impl From<LLMError> for DispatchError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Api(message) => DispatchError::Upstream(message),
            other => DispatchError::Upstream(other.to_string()),
        }
    }
}

impl From<ModerationRejected> for DispatchError {
    fn from(err: ModerationRejected) -> Self {
        DispatchError::Policy(err.to_string())
    }
}
