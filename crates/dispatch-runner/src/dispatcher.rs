//! Dispatcher entry point.
//!
//! One `dispatch` call runs the whole pipeline for a single request:
//! validate → fit quotes → moderate → assemble → reserve → invoke →
//! aggregate (streaming) or parse (batch) → report usage.

use std::sync::Arc;

use dispatch_core::{
    assemble_prompt, fit_quotes, reserve_response_tokens, CatalogPricing, CompletedExchange,
    Message, ModelCapabilities, ModelCatalog, PriceLookup, PromptInput, QuoteItem,
    SharedTokenCounter, UsageRecord, UsageReporter, DEFAULT_QUOTE_TEMPLATE,
};
use dispatch_llm::{ApiCredential, CompletionClient, CompletionRequest};
use serde::Deserialize;

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::invoker::{build_completion_request, normalize_temperature, CompletionInvoker};
use crate::moderation::{moderation_text, Moderator};
use crate::sink::{LiveChannel, LiveEvent};
use crate::stream::{StreamAggregator, StreamState};

const DEFAULT_MAX_TOKEN: u32 = 4000;

/// One chat turn to dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchRequest {
    pub module_name: String,
    /// Falls back to the configured default model
    pub model: Option<String>,
    /// Caller scale, 0-10
    pub temperature: f64,
    /// Requested response budget before clamping to the context window
    pub max_token: u32,
    pub history: Vec<Message>,
    pub quotes: Vec<QuoteItem>,
    pub user_chat_input: String,
    pub system_prompt: String,
    pub limit_prompt: Option<String>,
    pub quote_template: Option<String>,
    pub quote_prompt: Option<String>,
    pub stream: bool,
    pub detail: bool,
    pub credential: Option<ApiCredential>,
    /// The answer feeds downstream nodes
    pub answer_has_targets: bool,
}

impl Default for DispatchRequest {
    fn default() -> Self {
        Self {
            module_name: String::new(),
            model: None,
            temperature: 0.0,
            max_token: DEFAULT_MAX_TOKEN,
            history: Vec::new(),
            quotes: Vec::new(),
            user_chat_input: String::new(),
            system_prompt: String::new(),
            limit_prompt: None,
            quote_template: None,
            quote_prompt: None,
            stream: false,
            detail: false,
            credential: None,
            answer_has_targets: false,
        }
    }
}

impl DispatchRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            user_chat_input: question.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub answer_text: String,
    pub usage: UsageRecord,
    /// False when the live client disconnected before the answer completed
    pub finish: bool,
    pub finish_reason: String,
}

struct Completion {
    answer: String,
    reported_tokens: Option<u32>,
    finish: bool,
    finish_reason: String,
}

pub struct ChatDispatcher {
    config: DispatcherConfig,
    catalog: ModelCatalog,
    invoker: CompletionInvoker,
    counter: SharedTokenCounter,
    moderator: Option<Arc<dyn Moderator>>,
    pricing: Arc<dyn PriceLookup>,
}

impl ChatDispatcher {
    pub fn new(
        config: DispatcherConfig,
        catalog: ModelCatalog,
        client: Arc<dyn CompletionClient>,
        counter: SharedTokenCounter,
    ) -> Self {
        let invoker = CompletionInvoker::new(client, config.request_timeout());
        Self {
            config,
            catalog,
            invoker,
            counter,
            moderator: None,
            pricing: Arc::new(CatalogPricing),
        }
    }

    pub fn with_moderator(mut self, moderator: Arc<dyn Moderator>) -> Self {
        self.moderator = Some(moderator);
        self
    }

    pub fn with_price_lookup(mut self, pricing: Arc<dyn PriceLookup>) -> Self {
        self.pricing = pricing;
        self
    }

    fn resolve_model(&self, requested: Option<&str>) -> Result<&ModelCapabilities, DispatchError> {
        requested
            .filter(|m| !m.is_empty())
            .or(self.config.default_model.as_deref())
            .and_then(|model| self.catalog.get(model))
            .ok_or_else(|| {
                DispatchError::Validation(
                    "The chat model is undefined, you need to select a chat model.".to_string(),
                )
            })
    }

    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        channel: &dyn LiveChannel,
    ) -> Result<DispatchResponse, DispatchError> {
        if request.user_chat_input.is_empty() {
            return Err(DispatchError::Validation("Question is empty".to_string()));
        }

        let capabilities = self.resolve_model(request.model.as_deref())?;
        let counter = self.counter.as_ref();

        let quote_template = request
            .quote_template
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_QUOTE_TEMPLATE);
        let quotes = fit_quotes(
            &request.quotes,
            quote_template,
            capabilities.quote_max_token,
            counter,
        );

        if capabilities.censor {
            self.moderate(&request, &quotes.text).await?;
        }

        let prompt = assemble_prompt(
            &PromptInput {
                system_prompt: &request.system_prompt,
                history: &request.history,
                quote_text: &quotes.text,
                quote_prompt: request.quote_prompt.as_deref(),
                limit_prompt: request.limit_prompt.as_deref(),
                question: &request.user_chat_input,
            },
            capabilities,
            counter,
        )?;

        let prompt_tokens = counter.count_messages(&prompt.filtered);
        let max_token = reserve_response_tokens(
            request.max_token,
            capabilities.context_max_token,
            prompt_tokens,
        )?;
        let temperature = normalize_temperature(request.temperature, capabilities.max_temperature);

        log::debug!(
            "Dispatching to '{}': {} messages, {} prompt tokens, {} response tokens, {} of {} quotes",
            capabilities.model,
            prompt.filtered.len(),
            prompt_tokens,
            max_token,
            quotes.retained.len(),
            request.quotes.len()
        );

        let completion_request = build_completion_request(
            capabilities,
            temperature,
            max_token,
            prompt.messages,
            request.stream,
        );

        let completion = if request.stream {
            self.run_stream(&completion_request, &request, channel).await?
        } else {
            self.run_batch(&completion_request, &request).await?
        };

        let usage = UsageReporter::new(counter, self.pricing.as_ref()).report(
            capabilities,
            CompletedExchange {
                module_name: &request.module_name,
                question: &request.user_chat_input,
                filtered: &prompt.filtered,
                answer: &completion.answer,
                reported_tokens: completion.reported_tokens,
                max_token,
                quotes: &quotes.retained,
                own_credential: request.credential.is_some(),
            },
        );

        log::info!(
            "Dispatch finished: model '{}', {} tokens, finish reason '{}'",
            usage.model,
            usage.tokens,
            completion.finish_reason
        );

        Ok(DispatchResponse {
            answer_text: completion.answer,
            usage,
            finish: completion.finish,
            finish_reason: completion.finish_reason,
        })
    }

    async fn moderate(&self, request: &DispatchRequest, quote_text: &str) -> Result<(), DispatchError> {
        let Some(moderator) = &self.moderator else {
            log::error!("Model requires moderation but no moderator is configured");
            return Err(DispatchError::Policy(
                "Content moderation is required but unavailable".to_string(),
            ));
        };

        let text = moderation_text(&request.system_prompt, quote_text, &request.user_chat_input);
        moderator.moderate(&text).await?;
        Ok(())
    }

    async fn run_stream(
        &self,
        completion_request: &CompletionRequest,
        request: &DispatchRequest,
        channel: &dyn LiveChannel,
    ) -> Result<Completion, DispatchError> {
        let stream = self
            .invoker
            .invoke_stream(completion_request, request.credential.clone())
            .await?;
        let streamed = StreamAggregator::new(channel, request.detail)
            .run(stream)
            .await?;

        let finish = streamed.state != StreamState::ClientClosed;
        if finish && request.answer_has_targets && !channel.is_closed() {
            channel.push(LiveEvent::answer("\n", request.detail));
        }

        Ok(Completion {
            answer: streamed.answer,
            reported_tokens: None,
            finish,
            finish_reason: streamed.finish_reason,
        })
    }

    async fn run_batch(
        &self,
        completion_request: &CompletionRequest,
        request: &DispatchRequest,
    ) -> Result<Completion, DispatchError> {
        let response = self
            .invoker
            .invoke_batch(completion_request, request.credential.clone())
            .await?;

        Ok(Completion {
            answer: response.answer().to_string(),
            reported_tokens: response.total_tokens(),
            finish: true,
            finish_reason: response.finish_reason().unwrap_or("stop").to_string(),
        })
    }
}
