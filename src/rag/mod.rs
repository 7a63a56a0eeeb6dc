//! Retrieval-augmented generation over the dermatology knowledge base.
//!
//! - `VectorStore`: persistence and similarity search (Supabase, SQLite)
//! - `TextSplitter`: fixed-separator chunking for ingestion
//! - `RagService`: query answering and document ingestion
//! - `seed_if_empty`: curated starter passages

mod prompt;
mod seed;
mod service;
mod splitter;
mod sqlite;
mod store;
mod supabase;

#[cfg(test)]
pub(crate) mod testing;

pub use prompt::{build_context, build_system_prompt, NO_CONTEXT_PLACEHOLDER};
pub use seed::{seed_if_empty, SeedOutcome, SEED_DOCUMENTS, SEED_SOURCE};
pub use service::{
    Answer, IngestRequest, IngestSummary, RagOptions, RagService, Retrieval, DEFAULT_SOURCE,
    EMPTY_QUERY_MESSAGE,
};
pub use splitter::{ChunkParams, TextSplitter, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
pub use sqlite::SqliteStore;
pub use store::{ChunkMatch, NewChunk, VectorStore};
pub use supabase::SupabaseStore;
