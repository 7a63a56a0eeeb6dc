use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::rejection_error;
use crate::core::errors::ApiError;
use crate::state::AppState;

const NO_MESSAGE: &str = "No message provided";

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = match payload {
        Ok(Json(payload)) => payload.message,
        Err(rejection) => {
            return Err(rejection_error(
                rejection.status(),
                &rejection.body_text(),
                NO_MESSAGE,
            ))
        }
    };

    let message = message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest(NO_MESSAGE.to_string()))?;

    let answer = state.rag.answer(&message).await?;
    Ok(Json(ChatResponse {
        response: answer.response,
    }))
}
