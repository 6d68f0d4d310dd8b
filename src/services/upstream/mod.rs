//! Upstream model access
//!
//! The relay only sees [`CompletionClient`] and [`TokenSource`]; the OpenAI
//! compatible HTTP client lives in [`openai`].

mod error_message;
pub mod openai;
#[cfg(test)]
pub mod scripted;

pub use error_message::{describe, GENERIC_FAILURE_MESSAGE};
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::UpstreamSettings;
use crate::types::ChatMessage;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx response, or an `error` object inside the stream
    #[error("model API error (status {status:?}): {body}")]
    Api { status: Option<u16>, body: Value },

    #[error("model API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API stream broke: {0}")]
    Stream(String),

    #[error("invalid chunk from model API: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Lazy, finite, non-restartable sequence of text fragments
#[async_trait]
pub trait TokenSource: Send {
    /// `None` once the upstream has finished; never yields again after an error
    async fn next_fragment(&mut self) -> Option<Result<String, UpstreamError>>;

    /// Release the upstream subscription. Safe to call more than once.
    fn cancel(&mut self);
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn open(
        &self,
        settings: &UpstreamSettings,
        messages: Vec<ChatMessage>,
    ) -> Result<Box<dyn TokenSource>, UpstreamError>;
}
