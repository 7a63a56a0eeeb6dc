use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::LlmSettings;
use crate::core::errors::ApiError;

/// Chat client for OpenAI-compatible gateways (`{base_url}/chat/completions`).
#[derive(Clone)]
pub struct OpenAiChatProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiChatProvider {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            model: settings.model.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiChatProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let (Some(obj), Some(temperature)) = (body.as_object_mut(), request.temperature) {
            obj.insert("temperature".to_string(), json!(temperature));
        }

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req.send().await.map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("LLM chat error ({}): {}", status, text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let choice = payload["choices"]
            .get(0)
            .ok_or_else(|| ApiError::Internal("LLM response contained no choices".to_string()))?;

        // Some gateways send `content: null` when the model produced nothing.
        let content = choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
