use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use derma_rag::core::config::AppPaths;
use derma_rag::core::logging;
use derma_rag::rag::{seed_if_empty, SeedOutcome};
use derma_rag::server;
use derma_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let state = AppState::initialize(paths).await?;

    if state.settings.store.seed_on_startup {
        let rag = &state.rag;
        match seed_if_empty(rag.store().as_ref(), rag.embedder().as_ref()).await {
            Ok(SeedOutcome::Seeded(count)) => {
                tracing::info!("Seeded {} documents into {}", count, rag.store().name())
            }
            Ok(SeedOutcome::AlreadyPopulated(count)) => {
                tracing::info!("{} already holds {} documents", rag.store().name(), count)
            }
            Err(err) => tracing::warn!("Skipping initial seed: {}", err),
        }
    }

    let bind_addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
