pub mod chat;
pub mod embed;
pub mod health;

use axum::http::StatusCode;

use crate::core::errors::ApiError;

/// Oversized bodies keep their 413; every other extractor rejection becomes
/// a 400 carrying `message`.
pub(crate) fn rejection_error(status: StatusCode, detail: &str, message: &str) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(detail.to_string());
    }
    tracing::debug!("Rejected request body: {}", detail);
    ApiError::BadRequest(message.to_string())
}
