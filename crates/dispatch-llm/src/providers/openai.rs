use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::protocol::{ChatCompletionResponse, CompletionRequest};
use crate::provider::{ByteStream, CompletionClient, InvokeOptions, LLMError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any endpoint speaking the OpenAI chat completions API.
pub struct OpenAICompatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAICompatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(base_url: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &CompletionRequest, options: &InvokeOptions) -> Result<Response> {
        // A caller credential replaces the key, and the base URL when it has one.
        let (api_key, base_url) = match &options.credential {
            Some(credential) => (
                credential.api_key.as_str(),
                credential.base_url.as_deref().unwrap_or(self.base_url.as_str()),
            ),
            None => (self.api_key.as_str(), self.base_url.as_str()),
        };

        log::debug!(
            "Calling {} with model '{}' (stream: {}, max_tokens: {})",
            Self::endpoint(base_url),
            request.model,
            request.stream,
            request.max_tokens
        );

        let response = self
            .client
            .post(Self::endpoint(base_url))
            .bearer_auth(api_key)
            .timeout(options.timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        options: &InvokeOptions,
    ) -> Result<ChatCompletionResponse> {
        let response = self.send(request, options).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        options: &InvokeOptions,
    ) -> Result<ByteStream> {
        let response = self.send(request, options).await?;
        let stream = response.bytes_stream().map(|chunk| chunk.map_err(LLMError::from));
        Ok(Box::pin(stream))
    }
}
