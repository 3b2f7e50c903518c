pub mod embedding_config;
pub mod linking_config;
pub mod llm_config;
pub mod personality_config;
pub mod principles_config;
pub mod retrieval_config;
pub mod storage_config;
pub mod tagging_config;

use serde::{Deserialize, Serialize};

pub use embedding_config::EmbeddingConfig;
pub use linking_config::LinkingConfig;
pub use llm_config::LlmConfig;
pub use personality_config::PersonalityConfig;
pub use principles_config::{CompactionConfig, PrinciplesConfig};
pub use retrieval_config::RetrievalConfig;
pub use storage_config::StorageConfig;
pub use tagging_config::TaggingConfig;

/// Top-level configuration aggregating all subsystem configs.
///
/// Unrecognised TOML fields are ignored; missing fields fall back to
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MnemosConfig {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub compaction: CompactionConfig,
    pub principles: PrinciplesConfig,
    pub personality: PersonalityConfig,
    pub linking: LinkingConfig,
    pub tagging: TaggingConfig,
}

impl MnemosConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Validate cross-field invariants not expressible in `Default` alone.
    ///
    /// Tier allocations must sum to 1 within epsilon, and limits must be
    /// non-negative. Intended to be called once at startup; a failure
    /// here should be treated as a fatal configuration error.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()?;
        self.retrieval.validate()?;
        Ok(())
    }
}
