use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ensure_consistent_dimensions, Embedder};
use crate::core::config::EmbeddingSettings;
use crate::core::errors::ApiError;

/// Embeddings client for OpenAI-compatible `/embeddings` endpoints
/// (text-embeddings-inference, llama.cpp, vLLM, OpenAI itself).
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, ApiError> {
        if settings.model.trim().is_empty() {
            return Err(ApiError::BadRequest("missing embedding model name".to_string()));
        }
        let endpoint = format!("{}/embeddings", settings.base_url.trim_end_matches('/'));
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
        })
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(ApiError::internal)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Embedding request failed ({}): {}",
                status, text
            )));
        }

        let payload: EmbeddingsResponse = res.json().await.map_err(ApiError::internal)?;
        let mut items = payload.data;
        if items.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Embedding response returned {} vectors for {} inputs",
                items.len(),
                inputs.len()
            )));
        }
        if items.iter().all(|item| item.index.is_some()) {
            items.sort_by_key(|item| item.index);
        }

        Ok(items.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        ensure_consistent_dimensions(&vectors, self.dimensions)?;
        Ok(vectors)
    }
}
