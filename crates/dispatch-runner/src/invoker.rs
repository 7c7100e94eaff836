//! Completion invocation: temperature scaling, default system text and the
//! per-request timeout.

use std::sync::Arc;
use std::time::Duration;

use dispatch_core::{CompletionMessage, ModelCapabilities};
use dispatch_llm::{
    ApiCredential, ByteStream, ChatCompletionResponse, CompletionClient, CompletionRequest,
    InvokeOptions, Result,
};

/// Worst-case generation latency for one request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(480);

/// Some providers reject a temperature of exactly zero.
pub const MIN_TEMPERATURE: f64 = 0.01;

/// Map the caller's 0-10 scale onto the model's range, rounded to two decimals.
pub fn normalize_temperature(raw: f64, max_temperature: f64) -> f64 {
    let raw = raw.clamp(0.0, 10.0);
    let scaled = (max_temperature * (raw / 10.0) * 100.0).round() / 100.0;
    scaled.max(MIN_TEMPERATURE)
}

/// Build the wire request, prepending the model's default system text.
pub fn build_completion_request(
    capabilities: &ModelCapabilities,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<CompletionMessage>,
    stream: bool,
) -> CompletionRequest {
    let default_system = capabilities
        .default_system
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(CompletionMessage::system);

    CompletionRequest {
        model: capabilities.model.clone(),
        temperature,
        max_tokens,
        messages: default_system.into_iter().chain(messages).collect(),
        stream,
    }
}

/// Calls the completion endpoint in batch or streaming mode.
pub struct CompletionInvoker {
    client: Arc<dyn CompletionClient>,
    timeout: Duration,
}

impl CompletionInvoker {
    pub fn new(client: Arc<dyn CompletionClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn options(&self, credential: Option<ApiCredential>) -> InvokeOptions {
        InvokeOptions {
            timeout: self.timeout,
            credential,
        }
    }

    pub async fn invoke_batch(
        &self,
        request: &CompletionRequest,
        credential: Option<ApiCredential>,
    ) -> Result<ChatCompletionResponse> {
        self.client.complete(request, &self.options(credential)).await
    }

    pub async fn invoke_stream(
        &self,
        request: &CompletionRequest,
        credential: Option<ApiCredential>,
    ) -> Result<ByteStream> {
        self.client
            .complete_stream(request, &self.options(credential))
            .await
    }
}
