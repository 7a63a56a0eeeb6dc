//! Typed view of `config.yml` + `secrets.yaml`.
//!
//! Every field has a default so an empty config file yields a runnable
//! service pointed at the stock endpoints.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    /// Browser UI directory holding `index.html`, `embed.html` and `static/`.
    /// Unset serves the JSON API only.
    pub web_root: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: Vec::new(),
            web_root: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://gen.ai.kku.ac.th/api/v1".to_string(),
            api_key: None,
            model: "gemini-3.1-pro-preview".to_string(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Expected vector length. `None` accepts whatever the model returns, as
    /// long as it stays consistent within a batch.
    pub dimensions: Option<usize>,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081/v1".to_string(),
            api_key: None,
            model: "BAAI/bge-m3".to_string(),
            dimensions: Some(1024),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Supabase,
    Sqlite,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "supabase" => Some(Self::Supabase),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for StoreBackend {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown store backend '{}'", raw))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub seed_on_startup: bool,
    /// Overrides the default `derma_rag.db` under the user data dir.
    pub sqlite_path: Option<PathBuf>,
    pub supabase: SupabaseSettings,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            seed_on_startup: true,
            sqlite_path: None,
            supabase: SupabaseSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub table: String,
    pub match_function: String,
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            table: "skin_documents".to_string(),
            match_function: "match_skin_documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub match_count: usize,
    pub match_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            match_count: 4,
            match_threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub default_chunk_size: i64,
    pub default_chunk_overlap: i64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            default_chunk_size: 500,
            default_chunk_overlap: 50,
        }
    }
}
