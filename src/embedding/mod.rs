//! Text embedding clients.

mod openai;

use async_trait::async_trait;

use crate::core::errors::ApiError;

pub use openai::OpenAiEmbedder;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, reported by `/api/status`.
    fn model(&self) -> &str;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::Internal("embedding response was empty".to_string()))
    }

    /// Embed a batch of passages, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// Checks that every vector has the same length, and the expected one when
/// configured.
pub fn ensure_consistent_dimensions(
    vectors: &[Vec<f32>],
    expected: Option<usize>,
) -> Result<usize, ApiError> {
    let Some(first) = vectors.first() else {
        return Ok(expected.unwrap_or(0));
    };
    let dim = first.len();
    if dim == 0 {
        return Err(ApiError::Internal("embedding vector is empty".to_string()));
    }
    if let Some(expected) = expected {
        if dim != expected {
            return Err(ApiError::Internal(format!(
                "embedding dimension mismatch: expected {}, got {}",
                expected, dim
            )));
        }
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(ApiError::Internal(format!(
            "embedding dimension mismatch within batch: {} vs {}",
            dim,
            bad.len()
        )));
    }
    Ok(dim)
}
