use std::sync::Arc;

use crate::core::config::{settings_from_value, AppPaths, ConfigService, Settings, StoreBackend};
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::llm::{LlmProvider, OpenAiChatProvider};
use crate::rag::{RagOptions, RagService, SqliteStore, SupabaseStore, VectorStore};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the resolved settings and the `RagService`, which owns the
/// embedder, vector store and LLM clients.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub rag: RagService,
}

impl AppState {
    /// Loads configuration and constructs every external client.
    ///
    /// Nothing here talks to the network except opening the SQLite file for
    /// the local backend; reachability problems surface on first use.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let raw = config
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        tracing::info!(
            "Effective configuration: {}",
            config.redact_sensitive_values(&raw)
        );
        let settings =
            settings_from_value(raw).map_err(|e| InitializationError::Config(e.into()))?;

        let rag = build_rag_service(&paths, &settings).await?;
        Ok(Self::new(settings, rag))
    }

    pub fn new(settings: Settings, rag: RagService) -> Arc<Self> {
        Arc::new(AppState {
            settings: Arc::new(settings),
            rag,
        })
    }
}

pub async fn build_rag_service(
    paths: &AppPaths,
    settings: &Settings,
) -> Result<RagService, InitializationError> {
    let embedder: Arc<dyn Embedder> = Arc::new(
        OpenAiEmbedder::new(&settings.embedding)
            .map_err(|e| InitializationError::Embedder(e.into()))?,
    );

    let store: Arc<dyn VectorStore> = match settings.store.backend {
        StoreBackend::Supabase => Arc::new(
            SupabaseStore::new(&settings.store.supabase)
                .map_err(|e| InitializationError::Store(e.into()))?,
        ),
        StoreBackend::Sqlite => {
            let db_path = settings
                .store
                .sqlite_path
                .clone()
                .unwrap_or_else(|| paths.db_path.clone());
            Arc::new(
                SqliteStore::with_path(db_path)
                    .await
                    .map_err(|e| InitializationError::Store(e.into()))?,
            )
        }
    };

    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiChatProvider::new(&settings.llm));

    tracing::info!(
        "RAG pipeline: embedder={} store={} llm={}",
        embedder.model(),
        store.name(),
        llm.model()
    );

    let options = RagOptions {
        retrieval: settings.retrieval,
        ingest: settings.ingest,
        temperature: settings.llm.temperature,
    };
    Ok(RagService::new(embedder, store, llm, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreSettings;

    #[tokio::test]
    async fn builds_sqlite_pipeline_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path());
        let settings = Settings {
            store: StoreSettings {
                backend: StoreBackend::Sqlite,
                ..StoreSettings::default()
            },
            ..Settings::default()
        };

        let rag = build_rag_service(&paths, &settings).await.unwrap();

        assert_eq!(rag.store().name(), "SQLite");
        assert_eq!(rag.embedder().model(), "BAAI/bge-m3");
        assert_eq!(rag.options().retrieval.match_count, 4);
        assert!(paths.db_path.exists());
    }

    #[tokio::test]
    async fn supabase_backend_without_credentials_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path());

        let err = build_rag_service(&paths, &Settings::default())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, InitializationError::Store(_)));
    }
}
