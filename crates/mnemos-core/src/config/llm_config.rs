//! Chat-completion endpoint configuration (ambient, mirrors
//! `EmbeddingConfig`'s role as the consumed LLM collaborator's surface).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub request_timeout_ms: u64,
    /// Enable the priority-queue wrapper.
    pub use_priority_queue: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            model: "default".to_string(),
            request_timeout_ms: 60_000,
            use_priority_queue: false,
        }
    }
}
