//! Retrieval-augmented answering and document ingestion.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::prompt::{build_context, build_system_prompt};
use super::splitter::{ChunkParams, TextSplitter};
use super::store::{ChunkMatch, NewChunk, VectorStore};
use crate::core::config::{IngestSettings, RetrievalSettings};
use crate::core::errors::ApiError;
use crate::embedding::Embedder;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// Returned instead of an answer when the question is blank.
pub const EMPTY_QUERY_MESSAGE: &str = "กรุณาพิมพ์คำถามของคุณค่ะ";

pub const DEFAULT_SOURCE: &str = "upload";

#[derive(Debug, Clone, Copy)]
pub struct RagOptions {
    pub retrieval: RetrievalSettings,
    pub ingest: IngestSettings,
    pub temperature: f64,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            retrieval: RetrievalSettings::default(),
            ingest: IngestSettings::default(),
            temperature: 0.1,
        }
    }
}

/// Outcome of the similarity lookup for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Matches(Vec<ChunkMatch>),
    NoMatches,
    /// The store could not be queried; answering continues without context.
    Unavailable(String),
}

impl Retrieval {
    fn from_result(result: Result<Vec<ChunkMatch>, ApiError>) -> Self {
        match result {
            Ok(matches) if matches.is_empty() => Retrieval::NoMatches,
            Ok(matches) => Retrieval::Matches(matches),
            Err(err) => Retrieval::Unavailable(err.to_string()),
        }
    }

    pub fn chunks(&self) -> &[ChunkMatch] {
        match self {
            Retrieval::Matches(matches) => matches,
            Retrieval::NoMatches | Retrieval::Unavailable(_) => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    /// `None` when the query was blank and nothing was looked up.
    pub retrieval: Option<Retrieval>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub text: String,
    pub chunk_size: Option<i64>,
    pub chunk_overlap: Option<i64>,
    pub source: Option<String>,
    pub filename: Option<String>,
}

impl IngestRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub chunks_added: usize,
    pub total_chars: usize,
    pub message: String,
}

/// Sequences embedder, store and LLM. All three are injected so tests can
/// substitute any of them.
#[derive(Clone)]
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
    options: RagOptions,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmProvider>,
        options: RagOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            options,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub fn options(&self) -> &RagOptions {
        &self.options
    }

    /// Embeds the query and looks up the closest chunks. Store errors are
    /// folded into [`Retrieval::Unavailable`]; embedding errors propagate.
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval, ApiError> {
        let query_vector = self.embedder.embed_query(query).await?;

        let result = self
            .store
            .match_chunks(
                &query_vector,
                self.options.retrieval.match_count,
                self.options.retrieval.match_threshold,
            )
            .await;

        let retrieval = Retrieval::from_result(result);
        match &retrieval {
            Retrieval::Unavailable(reason) => {
                tracing::warn!("{} retrieval error: {}", self.store.name(), reason);
            }
            Retrieval::Matches(matches) => {
                tracing::debug!("Retrieved {} chunks", matches.len());
            }
            Retrieval::NoMatches => tracing::debug!("No chunks above threshold"),
        }
        Ok(retrieval)
    }

    pub async fn answer(&self, query: &str) -> Result<Answer, ApiError> {
        if query.trim().is_empty() {
            return Ok(Answer {
                response: EMPTY_QUERY_MESSAGE.to_string(),
                retrieval: None,
            });
        }

        let retrieval = self.retrieve(query).await?;
        let context = build_context(retrieval.chunks());
        let system_prompt = build_system_prompt(&context);

        let request = ChatRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(query),
        ])
        .with_temperature(self.options.temperature);

        let response = self.llm.chat(request).await?;

        Ok(Answer {
            response,
            retrieval: Some(retrieval),
        })
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestSummary, ApiError> {
        if request.text.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "ข้อความว่างเปล่า ไม่สามารถ Embed ได้".to_string(),
            ));
        }

        let params = ChunkParams::clamped(
            request
                .chunk_size
                .unwrap_or(self.options.ingest.default_chunk_size),
            request
                .chunk_overlap
                .unwrap_or(self.options.ingest.default_chunk_overlap),
        );
        let total_chars = request.text.chars().count();

        let chunks = TextSplitter::new(params).split_text(request.text.trim());
        if chunks.is_empty() {
            return Err(ApiError::BadRequest(
                "ไม่สามารถแบ่ง Chunk ได้ — กรุณาตรวจสอบข้อความอีกครั้ง".to_string(),
            ));
        }

        tracing::info!(
            "Embedding {} chunks with {} ...",
            chunks.len(),
            self.embedder.model()
        );
        let vectors = self.embedder.embed_documents(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(ApiError::Internal(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let chunk_count = chunks.len();
        let source = request
            .source
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let ingested_at = chrono::Utc::now().to_rfc3339();

        let rows: Vec<NewChunk> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(chunk_index, (content, embedding))| {
                let mut metadata = json!({
                    "chunk_index": chunk_index,
                    "chunk_count": chunk_count,
                    "chunk_size": params.chunk_size,
                    "overlap": params.chunk_overlap,
                    "total_chars": total_chars,
                    "ingested_at": ingested_at,
                });
                if let (Some(filename), Some(map)) = (&request.filename, metadata.as_object_mut()) {
                    map.insert("filename".to_string(), json!(filename));
                }
                NewChunk {
                    content,
                    embedding,
                    source: source.clone(),
                    metadata,
                }
            })
            .collect();

        self.store.insert_batch(rows).await?;

        tracing::info!(
            "Inserted {} chunks into {} ({} chars total).",
            chunk_count,
            self.store.name(),
            total_chars
        );

        Ok(IngestSummary {
            chunks_added: chunk_count,
            total_chars,
            message: format!(
                "เพิ่ม {} chunks เข้าฐานข้อมูล {} สำเร็จ",
                chunk_count,
                self.store.name()
            ),
        })
    }
}
