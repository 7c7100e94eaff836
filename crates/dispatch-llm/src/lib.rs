pub mod protocol;
pub mod provider;
pub mod providers;

pub use protocol::{
    parse_stream_event, ChatCompletionResponse, CompletionRequest, StreamEvent,
};
pub use provider::{ApiCredential, ByteStream, CompletionClient, InvokeOptions, LLMError, Result};
pub use providers::OpenAICompatClient;
