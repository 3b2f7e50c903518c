//! Embedding endpoint configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub dimensions: usize,
    pub request_timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/embeddings".to_string(),
            dimensions: 768,
            request_timeout_ms: 10_000,
        }
    }
}
