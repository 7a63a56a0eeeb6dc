//! SQLite-backed vector store.
//!
//! Local stand-in for the remote pgvector table: rows live in SQLite and
//! search is brute-force cosine similarity over every stored embedding.

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkMatch, NewChunk, VectorStore};
use crate::core::errors::ApiError;

const EMBEDDING_DIM_KEY: &str = "embedding_dim";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database; everything is lost when the store drops.
    pub async fn in_memory() -> Result<Self, ApiError> {
        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(ApiError::internal)?;

        // A single connection, otherwise each connection sees its own database.
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, ApiError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS skin_documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    /// Dimension fixed by the first insert, if any.
    pub async fn embedding_dim(&self) -> Result<Option<usize>, ApiError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?1")
                .bind(EMBEDDING_DIM_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        Ok(value.and_then(|v| v.parse::<usize>().ok()))
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_match(row: &sqlx::sqlite::SqliteRow, similarity: f32) -> ChunkMatch {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Value>(&metadata_str).ok();

        ChunkMatch {
            id: Some(Value::from(row.get::<i64, _>("id"))),
            content: row.get("content"),
            source: Some(row.get("source")),
            metadata,
            similarity: Some(similarity),
        }
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn name(&self) -> &str {
        "SQLite"
    }

    async fn insert_batch(&self, chunks: Vec<NewChunk>) -> Result<usize, ApiError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let batch_dim = chunks[0].embedding.len();
        if chunks.iter().any(|c| c.embedding.len() != batch_dim) {
            return Err(ApiError::Internal(
                "embedding dimension differs within insert batch".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        let stored_dim: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?1")
                .bind(EMBEDDING_DIM_KEY)
                .fetch_optional(&mut *tx)
                .await
                .map_err(ApiError::internal)?;

        match stored_dim.and_then(|v| v.parse::<usize>().ok()) {
            Some(dim) if dim != batch_dim => {
                return Err(ApiError::Internal(format!(
                    "embedding dimension mismatch: store holds {}-dim vectors, got {}",
                    dim, batch_dim
                )));
            }
            Some(_) => {}
            None => {
                sqlx::query("INSERT INTO store_meta (key, value) VALUES (?1, ?2)")
                    .bind(EMBEDDING_DIM_KEY)
                    .bind(batch_dim.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(ApiError::internal)?;
            }
        }

        for chunk in &chunks {
            let blob = Self::serialize_embedding(&chunk.embedding);
            let metadata_str = serde_json::to_string(&chunk.metadata).map_err(ApiError::internal)?;

            sqlx::query(
                "INSERT INTO skin_documents (content, source, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(chunks.len())
    }

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        match_threshold: f32,
    ) -> Result<Vec<ChunkMatch>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, content, source, metadata, embedding
             FROM skin_documents",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<ChunkMatch> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = cosine_similarity(query_embedding, &stored_emb);
                (score > match_threshold).then(|| Self::row_to_match(row, score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(match_count);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skin_documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}
