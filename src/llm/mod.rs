pub mod client;

use async_trait::async_trait;

use crate::error::ModelError;

pub use client::{ChatMessage, LlmClient, LlmResponse};

/// A hosted chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ModelError>;
}
