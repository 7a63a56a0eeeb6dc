use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::rejection_error;
use crate::core::errors::ApiError;
use crate::documents::{extract_text, DocumentKind};
use crate::rag::{IngestRequest, IngestSummary};
use crate::state::AppState;

const NO_FILE: &str = "ไม่พบไฟล์ในคำขอ";
const NO_TEXT: &str = "ไม่พบข้อความในคำขอ";

#[derive(Debug, Default, Deserialize)]
pub struct EmbedPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<Value>,
    #[serde(default)]
    pub chunk_overlap: Option<Value>,
}

/// Ingests either an uploaded `.txt`/`.docx` file (multipart) or a JSON
/// `{text}` body.
pub async fn embed(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<IngestSummary>, ApiError> {
    let ingest = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| {
                rejection_error(rejection.status(), &rejection.body_text(), NO_FILE)
            })?;
        ingest_from_multipart(multipart).await?
    } else {
        let payload = match Json::<EmbedPayload>::from_request(request, &state).await {
            Ok(Json(payload)) => payload,
            Err(rejection) => {
                return Err(rejection_error(
                    rejection.status(),
                    &rejection.body_text(),
                    NO_TEXT,
                ))
            }
        };
        ingest_from_json(payload)?
    };

    let summary = state.rag.ingest(ingest).await?;
    tracing::info!("{}", summary.message);
    Ok(Json(summary))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn ingest_from_json(payload: EmbedPayload) -> Result<IngestRequest, ApiError> {
    let text = payload
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(NO_TEXT.to_string()))?;

    let mut request = IngestRequest::new(text);
    request.chunk_size = payload
        .chunk_size
        .map(|v| integer_param("chunk_size", &v))
        .transpose()?;
    request.chunk_overlap = payload
        .chunk_overlap
        .map(|v| integer_param("chunk_overlap", &v))
        .transpose()?;
    Ok(request)
}

async fn ingest_from_multipart(mut multipart: Multipart) -> Result<IngestRequest, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut chunk_size = None;
    let mut chunk_overlap = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !filename.is_empty() {
                    upload = Some((filename, bytes.to_vec()));
                }
            }
            "chunk_size" | "chunk_overlap" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let value = parse_integer(&name, &raw)?;
                if name == "chunk_size" {
                    chunk_size = Some(value);
                } else {
                    chunk_overlap = Some(value);
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::BadRequest(NO_FILE.to_string()))?;
    let kind = DocumentKind::from_filename(&filename)?;
    let text = extract_text(kind, &bytes)?;
    tracing::debug!(
        "Extracted {} chars from {} ({} bytes)",
        text.chars().count(),
        filename,
        bytes.len()
    );

    let mut request = IngestRequest::new(text);
    request.chunk_size = chunk_size;
    request.chunk_overlap = chunk_overlap;
    request.filename = Some(filename);
    Ok(request)
}

fn multipart_error(err: MultipartError) -> ApiError {
    rejection_error(err.status(), &err.body_text(), NO_FILE)
}

fn integer_param(name: &str, value: &Value) -> Result<i64, ApiError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| not_an_integer(name, &number.to_string())),
        Value::String(raw) => parse_integer(name, raw),
        other => Err(not_an_integer(name, &other.to_string())),
    }
}

fn parse_integer(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| not_an_integer(name, raw))
}

fn not_an_integer(name: &str, raw: &str) -> ApiError {
    ApiError::BadRequest(format!("{} ต้องเป็นจำนวนเต็ม (ได้รับ '{}')", name, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_and_numeric_strings_are_accepted() {
        assert_eq!(integer_param("chunk_size", &json!(300)).unwrap(), 300);
        assert_eq!(integer_param("chunk_size", &json!(" 120 ")).unwrap(), 120);
        assert!(integer_param("chunk_size", &json!(12.5)).is_err());
        assert!(integer_param("chunk_size", &json!("abc")).is_err());
        assert!(integer_param("chunk_size", &json!(null)).is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        let payload = EmbedPayload {
            text: Some("  \n ".to_string()),
            ..EmbedPayload::default()
        };
        let err = ingest_from_json(payload).unwrap_err();
        assert_eq!(err.message(), NO_TEXT);
    }

    #[test]
    fn json_params_flow_into_the_request() {
        let payload = EmbedPayload {
            text: Some("สิว".to_string()),
            chunk_size: Some(json!(100)),
            chunk_overlap: None,
        };
        let request = ingest_from_json(payload).unwrap();
        assert_eq!(request.chunk_size, Some(100));
        assert_eq!(request.chunk_overlap, None);
        assert_eq!(request.filename, None);
    }
}
