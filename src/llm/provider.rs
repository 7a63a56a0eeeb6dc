use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// model identifier sent with every request
    fn model(&self) -> &str;

    /// chat completion (non-streaming); returns the assistant message text
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;
}
