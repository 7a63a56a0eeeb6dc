use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Backend names plus the stored chunk count; `documents` is `null` when the
/// store cannot be reached.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rag = &state.rag;
    let documents = match rag.store().count().await {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!("{} count failed: {}", rag.store().name(), err);
            None
        }
    };

    Json(json!({
        "store": rag.store().name(),
        "documents": documents,
        "embedding_model": rag.embedder().model(),
        "llm_model": rag.llm().model(),
    }))
}
