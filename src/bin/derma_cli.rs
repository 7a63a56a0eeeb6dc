//! Interactive console for asking the knowledge base questions.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use derma_rag::core::config::AppPaths;
use derma_rag::core::logging;
use derma_rag::rag::seed_if_empty;
use derma_rag::state::AppState;

const PROMPT: &str = "สอบถาม (exit เพื่อออก): ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);
    let state = AppState::initialize(paths).await?;

    if state.settings.store.seed_on_startup {
        let rag = &state.rag;
        if let Err(err) = seed_if_empty(rag.store().as_ref(), rag.embedder().as_ref()).await {
            tracing::warn!("Skipping initial seed: {}", err);
        }
    }

    println!(
        "--- DermaAI RAG System ({} + {}) ---",
        state.rag.store().name(),
        state.rag.llm().model()
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let Some(query) = lines.next_line().await? else {
            break;
        };
        if query.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        match state.rag.answer(&query).await {
            Ok(answer) => println!("\nคำตอบ: {}\n", answer.response),
            Err(err) => eprintln!("\nเกิดข้อผิดพลาด: {}\n", err.message()),
        }
    }

    Ok(())
}
