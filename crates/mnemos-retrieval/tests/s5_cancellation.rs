use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mnemos_core::config::{PersonalityConfig, PrinciplesConfig, RetrievalConfig};
use mnemos_core::errors::{EmbeddingError, MnemosError};
use mnemos_core::models::{Memory, Tier};
use mnemos_core::traits::{Embedder, MemoryStore};
use mnemos_linker::Linker;
use mnemos_llm::StaticLlmClient;
use mnemos_retrieval::RetrievalFrontEnd;
use mnemos_storage::{ConnectionPool, SqliteMemoryStore, SqliteRelationalStore, SqliteVectorStore};

/// Takes 200ms to embed anything — slower than the 50ms deadline the test
/// configures `Retrieve` with.
struct SlowEmbedder;

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(vec![0.1, 0.2, 0.3, 0.4])
    }
    fn dimensions(&self) -> usize {
        4
    }
}

/// Start a retrieval with a 50ms deadline against a stubbed slow
/// embedder (200ms): `DeadlineExceeded`, no memory written, no access
/// metadata mutated.
#[tokio::test]
async fn deadline_exceeded_leaves_store_untouched() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool.clone()));
    let embedder: Arc<dyn Embedder> = Arc::new(SlowEmbedder);
    let store = Arc::new(SqliteMemoryStore::new(vector_store.clone(), embedder.clone()));
    let relational = Arc::new(SqliteRelationalStore::new(pool));
    let llm = Arc::new(StaticLlmClient::new(""));

    let memory = Memory::new("pre-existing memory".to_string(), vec![0.1, 0.2, 0.3, 0.4], None);
    let memory_id = memory.id;
    store.store(memory).await.unwrap();

    let front_end = RetrievalFrontEnd::new(
        store.clone(),
        vector_store,
        relational,
        embedder,
        llm,
        Linker::new(Default::default()),
        RetrievalConfig {
            deadline_ms: 50,
            min_score: 0.0,
            ..RetrievalConfig::default()
        },
        PersonalityConfig::default(),
        PrinciplesConfig::default(),
    );

    let result = front_end.retrieve(None, "anything").await;
    assert!(matches!(result, Err(MnemosError::DeadlineExceeded { .. })));

    let reloaded = store.get_by_id(memory_id).await.unwrap().unwrap();
    assert_eq!(reloaded.access_count, 0);

    let count = store.count_by_tier(Tier::Recent, None).await.unwrap();
    assert_eq!(count, 1, "retrieve must not have written a new memory");
}
