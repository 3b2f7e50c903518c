use async_trait::async_trait;

use crate::errors::EmbeddingError;

/// Turns text into a dense vector via an external embedding service.
///
/// Input must be non-empty; output vector dimension is constant for the
/// lifetime of a store. Implementations must retry at most once on a
/// transient transport failure before surfacing the error.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output vector dimension, constant for the lifetime of the store.
    fn dimensions(&self) -> usize;
}
