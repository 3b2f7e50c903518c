use async_trait::async_trait;
use mnemos_core::errors::EmbeddingError;
use mnemos_core::traits::Embedder;

/// Deterministic test double. Produces a vector with a strong shared
/// component plus a small text-specific perturbation, so cosine similarity
/// between near-identical texts stays high without a real model — the same
/// shape as a golden-test embedder, used across crates' test suites
/// instead of a live network call.
pub struct StaticEmbedder {
    dimensions: usize,
}

impl StaticEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for StaticEmbedder {
    fn default() -> Self {
        Self::new(32)
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        let hash = text
            .as_bytes()
            .iter()
            .fold(0u64, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut v = vec![0.5f32; self.dimensions];
        for (i, slot) in v.iter_mut().enumerate() {
            let noise = ((hash.wrapping_add(i as u64) % 1000) as f32) / 100_000.0;
            *slot += noise;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn similar_text_yields_similar_embedding() {
        let embedder = StaticEmbedder::new(16);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_input_rejected() {
        let embedder = StaticEmbedder::default();
        assert!(matches!(
            embedder.embed("").await,
            Err(EmbeddingError::EmptyInput)
        ));
    }
}
