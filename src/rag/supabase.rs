//! Supabase (PostgREST + pgvector) vector store.
//!
//! Similarity search runs server-side through a SQL function exposed as an
//! RPC; this client only shapes requests and parses rows.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};

use super::store::{ChunkMatch, NewChunk, VectorStore};
use crate::core::config::SupabaseSettings;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    rest_url: String,
    table: String,
    match_function: String,
}

impl SupabaseStore {
    pub fn new(settings: &SupabaseSettings) -> Result<Self, ApiError> {
        let url = settings.url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(ApiError::BadRequest(
                "store.supabase.url is required for the supabase backend".to_string(),
            ));
        }
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ApiError::BadRequest(
                    "store.supabase.api_key is required for the supabase backend".to_string(),
                )
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).map_err(ApiError::bad_request)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(ApiError::bad_request)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url),
            table: settings.table.clone(),
            match_function: settings.match_function.clone(),
        })
    }

    async fn error_for(res: reqwest::Response, action: &str) -> ApiError {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        ApiError::Internal(format!("Supabase {} failed ({}): {}", action, status, text))
    }
}

/// Total from a PostgREST `Content-Range` header (`0-0/13`, `*/0`).
fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl VectorStore for SupabaseStore {
    fn name(&self) -> &str {
        "Supabase"
    }

    async fn insert_batch(&self, chunks: Vec<NewChunk>) -> Result<usize, ApiError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/{}", self.rest_url, self.table);
        let res = self
            .client
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(&chunks)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(Self::error_for(res, "insert").await);
        }

        Ok(chunks.len())
    }

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        match_threshold: f32,
    ) -> Result<Vec<ChunkMatch>, ApiError> {
        let url = format!("{}/rpc/{}", self.rest_url, self.match_function);
        let body = json!({
            "query_embedding": query_embedding,
            "match_count": match_count,
            "match_threshold": match_threshold,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(Self::error_for(res, "rpc").await);
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        match payload {
            Value::Null => Ok(Vec::new()),
            other => serde_json::from_value(other).map_err(ApiError::internal),
        }
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let url = format!("{}/{}", self.rest_url, self.table);
        let res = self
            .client
            .get(&url)
            .query(&[("select", "id"), ("limit", "1")])
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(Self::error_for(res, "count").await);
        }

        let header_total = res
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);
        if let Some(total) = header_total {
            return Ok(total);
        }

        let rows: Vec<Value> = res.json().await.map_err(ApiError::internal)?;
        Ok(rows.len())
    }
}
