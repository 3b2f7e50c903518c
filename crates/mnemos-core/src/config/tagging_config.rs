//! Tagger batch size.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    pub batch_size: usize,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self { batch_size: 25 }
    }
}
