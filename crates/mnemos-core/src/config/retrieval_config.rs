//! Search shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_memories: usize,
    pub min_score: f64,
    pub max_linked_memories: usize,
    /// Deadline for a retrieval-path call.
    pub deadline_ms: u64,
    /// `RecordTurn` skips the write when the user turn is shorter than this.
    pub min_content_length: usize,
    /// `RecordTurn` skips the write when the assistant turn is shorter than this.
    pub min_response_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_memories: 10,
            min_score: 0.5,
            max_linked_memories: 5,
            deadline_ms: 120_000,
            min_content_length: 20,
            min_response_length: 20,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_memories == 0 {
            return Err("retrieval.max_memories must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err("retrieval.min_score must be in [0,1]".to_string());
        }
        Ok(())
    }
}
