use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{ChatCompletionResponse, CompletionRequest};

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Raw transport chunks of a streaming completion, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A caller-supplied provider account. Requests made with it are not billed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredential {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Per-call transport options.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    /// Request-level timeout covering the whole generation
    pub timeout: Duration,
    pub credential: Option<ApiCredential>,
}

/// The remote chat completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single-shot completion returning one structured payload.
    async fn complete(
        &self,
        request: &CompletionRequest,
        options: &InvokeOptions,
    ) -> Result<ChatCompletionResponse>;

    /// Streaming completion returning the raw incremental payload.
    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        options: &InvokeOptions,
    ) -> Result<ByteStream>;
}
