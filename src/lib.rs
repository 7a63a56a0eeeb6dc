pub mod core;
pub mod documents;
pub mod embedding;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
