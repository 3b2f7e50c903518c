use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::config::{PersonalityConfig, PrinciplesConfig, RetrievalConfig};
use mnemos_core::errors::EmbeddingError;
use mnemos_core::models::{Memory, MemoryId, OutcomeTag};
use mnemos_core::traits::{Embedder, MemoryStore};
use mnemos_linker::Linker;
use mnemos_llm::StaticLlmClient;
use mnemos_retrieval::RetrievalFrontEnd;
use mnemos_storage::{ConnectionPool, SqliteMemoryStore, SqliteRelationalStore, SqliteVectorStore};

/// Always embeds to the same fixed vector, so a query's embedding is
/// under the test's direct control — the scenario fixes the query vector,
/// not the query text.
struct FixedVectorEmbedder {
    vector: Vec<f32>,
}

#[async_trait]
impl Embedder for FixedVectorEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector.clone())
    }
    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Configure dim=4, insert three memories (good/bad/neutral), search the
/// good vector with bias=0.5, limit=2: good first, neutral second,
/// bad excluded from the top two.
#[tokio::test]
async fn good_tagged_outranks_neutral_and_excludes_bad() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool.clone()));
    let embedder: Arc<dyn Embedder> = Arc::new(FixedVectorEmbedder {
        vector: vec![1.0, 0.0, 0.0, 0.0],
    });
    let store = Arc::new(SqliteMemoryStore::new(vector_store.clone(), embedder.clone()));
    let relational = Arc::new(SqliteRelationalStore::new(pool));
    let llm = Arc::new(StaticLlmClient::new(""));

    let mut good = Memory::new("good".to_string(), vec![1.0, 0.0, 0.0, 0.0], None);
    good.outcome_tag = OutcomeTag::Good;
    let mut bad = Memory::new("bad".to_string(), vec![0.0, 1.0, 0.0, 0.0], None);
    bad.outcome_tag = OutcomeTag::Bad;
    let mut neutral = Memory::new("neutral".to_string(), vec![0.9, 0.1, 0.0, 0.0], None);
    neutral.outcome_tag = OutcomeTag::Neutral;

    let good_id = store.store(good).await.unwrap();
    let bad_id = store.store(bad).await.unwrap();
    let neutral_id = store.store(neutral).await.unwrap();

    let front_end = RetrievalFrontEnd::new(
        store.clone(),
        vector_store,
        relational,
        embedder,
        llm,
        Linker::new(Default::default()),
        RetrievalConfig {
            max_memories: 2,
            min_score: 0.0,
            ..RetrievalConfig::default()
        },
        PersonalityConfig {
            good_behaviour_bias: 0.5,
            ..PersonalityConfig::default()
        },
        PrinciplesConfig::default(),
    );

    let result = front_end.retrieve(None, "find something relevant").await.unwrap();

    let ids: Vec<MemoryId> = result.memories.iter().map(|m| m.memory.id).collect();
    assert_eq!(ids, vec![good_id, neutral_id]);
    assert!(!ids.contains(&bad_id));
    assert!(result.memories[0].score >= result.memories[1].score);
    assert_eq!(result.embedding, vec![1.0, 0.0, 0.0, 0.0]);
    assert!(!result.system_prompt.is_empty());
}
