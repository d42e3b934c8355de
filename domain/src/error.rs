use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy shared by ingestion, retrieval and generation.
///
/// Everything else travels as `anyhow::Error`; callers that need to branch on
/// one of these use `err.downcast_ref::<RagError>()`.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("PDF directory {0} not found; add the course PDFs there first")]
    CorpusNotFound(PathBuf),

    #[error("no PDF files found in {0}")]
    NoPdfFiles(PathBuf),

    #[error("no chunks to index")]
    NoInput,

    #[error("vector index not found at {0}; run `rag_coach ingest` first")]
    IndexNotFound(PathBuf),

    #[error("vector index already exists at {0}; pass --force to recreate it")]
    IndexExists(PathBuf),

    #[error("index was built with embedding model {expected} ({expected_dim} dims), got {actual} ({actual_dim} dims)")]
    EmbeddingMismatch {
        expected: String,
        expected_dim: usize,
        actual: String,
        actual_dim: usize,
    },

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// True for the "no PDFs at the expected location" family.
    pub fn is_corpus_missing(&self) -> bool {
        matches!(self, Self::CorpusNotFound(_) | Self::NoPdfFiles(_))
    }
}
