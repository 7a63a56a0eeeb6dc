//! VectorStore trait — abstract interface for knowledge-base backends.
//!
//! Rows are append-only: a chunk is written once and never updated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

/// A chunk ready to be persisted. Serialises to the persisted row schema
/// `{content, embedding, source, metadata}`.
#[derive(Debug, Clone, Serialize)]
pub struct NewChunk {
    pub content: String,
    pub embedding: Vec<f32>,
    pub source: String,
    pub metadata: Value,
}

/// A row returned by a similarity query. Only `content` is guaranteed by the
/// remote RPC contract; `id` is kept as raw JSON since remote tables may key
/// rows by bigint or uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMatch {
    #[serde(default)]
    pub id: Option<Value>,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Similarity score (higher = better).
    #[serde(default)]
    pub similarity: Option<f32>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Human-readable backend name ("Supabase", "SQLite").
    fn name(&self) -> &str;

    /// Append rows. Returns the number written.
    async fn insert_batch(&self, chunks: Vec<NewChunk>) -> Result<usize, ApiError>;

    /// Up to `match_count` chunks whose similarity exceeds `match_threshold`,
    /// best first.
    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        match_threshold: f32,
    ) -> Result<Vec<ChunkMatch>, ApiError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, ApiError>;
}
