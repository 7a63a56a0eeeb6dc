//! Test doubles for the embedder, store and LLM seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::store::{ChunkMatch, NewChunk, VectorStore};
use crate::core::errors::ApiError;
use crate::embedding::Embedder;
use crate::llm::{ChatRequest, LlmProvider};

const FAKE_DIM: usize = 64;

/// Deterministic bag-of-characters embedder: identical texts map to identical
/// vectors, so a query equal to a stored chunk scores ~1.0 against it.
#[derive(Default)]
pub struct FakeEmbedder {
    query_calls: AtomicUsize,
    document_calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; FAKE_DIM];
        for c in text.chars() {
            vector[(c as usize) % FAKE_DIM] += 1.0;
        }
        vector
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model(&self) -> &str {
        "fake-embedder"
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector_for(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Embedder whose upstream is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model(&self) -> &str {
        "failing-embedder"
    }

    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Err(ApiError::Internal("embedding service unreachable".to_string()))
    }
}

/// Store that fails every call.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn insert_batch(&self, _chunks: Vec<NewChunk>) -> Result<usize, ApiError> {
        Err(ApiError::Internal("store unreachable".to_string()))
    }

    async fn match_chunks(
        &self,
        _query_embedding: &[f32],
        _match_count: usize,
        _match_threshold: f32,
    ) -> Result<Vec<ChunkMatch>, ApiError> {
        Err(ApiError::Internal("store unreachable".to_string()))
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Err(ApiError::Internal("store unreachable".to_string()))
    }
}

/// LLM that records every request and answers with a fixed reply.
pub struct RecordingLlm {
    reply: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl RecordingLlm {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    fn model(&self) -> &str {
        "recording-llm"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        Ok(self.reply.clone())
    }
}

/// LLM gateway that always errors.
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    fn model(&self) -> &str {
        "failing-llm"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<String, ApiError> {
        Err(ApiError::Internal("LLM chat error (502): bad gateway".to_string()))
    }
}
