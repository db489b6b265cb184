//! Provider abstraction over OpenAI-compatible chat-completions APIs.
//!
//! The service makes two kinds of remote calls through the same seam: the
//! user-facing chat relay and the report extraction call. Both go through
//! the [`Provider`] trait so tests can substitute a scripted in-process
//! implementation.

pub mod http_client;
pub mod openai;
pub mod traits;
pub mod types;

pub use openai::OpenAiProvider;
pub use traits::Provider;
pub use types::{
    ContentBlock, GenerationParams, ImageSource, MessageRole, ProviderMessage, ProviderResponse,
};
