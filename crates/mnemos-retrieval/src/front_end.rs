//! `RetrievalFrontEnd`: the process-facing facade composing the memory
//! store, linker, and principles engine behind the four operations
//! chat handlers and the reflection hook actually call.

use std::sync::Arc;

use mnemos_core::config::{PersonalityConfig, PrinciplesConfig, RetrievalConfig};
use mnemos_core::traits::{Embedder, LlmClient, MemoryStore, RelationalStore, VectorStore};
use mnemos_linker::Linker;
use mnemos_principles::PrinciplesEngine;

pub struct RetrievalFrontEnd {
    pub(crate) store: Arc<dyn MemoryStore>,
    pub(crate) vector_store: Arc<dyn VectorStore>,
    pub(crate) relational: Arc<dyn RelationalStore>,
    pub(crate) embedder: Arc<dyn Embedder>,
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) linker: Linker,
    pub(crate) principles: PrinciplesEngine,
    pub(crate) retrieval_config: RetrievalConfig,
    pub(crate) personality_config: PersonalityConfig,
    pub(crate) principles_config: PrinciplesConfig,
}

impl RetrievalFrontEnd {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        vector_store: Arc<dyn VectorStore>,
        relational: Arc<dyn RelationalStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        linker: Linker,
        retrieval_config: RetrievalConfig,
        personality_config: PersonalityConfig,
        principles_config: PrinciplesConfig,
    ) -> Self {
        let principles = PrinciplesEngine::new(principles_config.clone());
        Self {
            store,
            vector_store,
            relational,
            embedder,
            llm,
            linker,
            principles,
            retrieval_config,
            personality_config,
            principles_config,
        }
    }
}
