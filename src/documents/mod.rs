//! Plain-text extraction from uploaded files.

mod decode;
mod docx;

use thiserror::Error;

use crate::core::errors::ApiError;

pub use decode::{decode_text, TextEncoding, DEFAULT_ENCODINGS};
pub use docx::extract_docx_text;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),
    #[error("{0}")]
    Unreadable(String),
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::UnsupportedExtension(_) => ApiError::BadRequest(
                "รองรับเฉพาะไฟล์ .txt และ .docx เท่านั้น".to_string(),
            ),
            DocumentError::Unreadable(reason) => {
                ApiError::BadRequest(format!("ไม่สามารถอ่านไฟล์ได้: {}", reason))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Docx,
}

impl DocumentKind {
    /// Kind from the part after the last `.`, case-insensitive. A name with
    /// no dot is treated as its own extension, so a bare `docx` is accepted.
    pub fn from_filename(filename: &str) -> Result<Self, DocumentError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or(filename)
            .to_ascii_lowercase();

        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "docx" => Ok(Self::Docx),
            _ => Err(DocumentError::UnsupportedExtension(ext)),
        }
    }
}

pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    match kind {
        DocumentKind::Text => Ok(decode_text(bytes, &DEFAULT_ENCODINGS)),
        DocumentKind::Docx => extract_docx_text(bytes),
    }
}
