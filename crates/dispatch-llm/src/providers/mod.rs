//! Completion client implementations.

pub mod openai;

pub use openai::OpenAICompatClient;
