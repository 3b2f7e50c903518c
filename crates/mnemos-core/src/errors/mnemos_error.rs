use super::{CompactionError, EmbeddingError, LlmError, PrinciplesError, StorageError, TaggingError};

/// Top-level error type for the Mnemos memory engine.
/// All subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum MnemosError {
    #[error("memory not found: {id}")]
    NotFound { id: String },

    #[error("duplicate id on store: {id}")]
    Conflict { id: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Format(String),

    #[error("deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("compaction error: {0}")]
    Compaction(#[from] CompactionError),

    #[error("principles error: {0}")]
    Principles(#[from] PrinciplesError),

    #[error("tagging error: {0}")]
    Tagging(#[from] TaggingError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("concurrency error: {0}")]
    Concurrency(String),

    #[error("embedding dimension mismatch: expected {expected}, found {found}")]
    EmbeddingMismatch { expected: usize, found: usize },
}

/// Convenience type alias.
pub type MnemosResult<T> = Result<T, MnemosError>;
