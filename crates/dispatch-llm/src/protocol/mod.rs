//! OpenAI-compatible wire types.
//!
//! Requests go out as chat completion bodies; answers come back either as a
//! single `chat.completion` document or as a stream of `chat.completion.chunk`
//! events terminated by `[DONE]`.

mod openai_compat;

pub use openai_compat::{
    extract_error_message, parse_stream_event, ChatCompletionResponse, CompletionRequest,
    StreamEvent, Usage,
};
