use std::sync::Arc;

use mnemos_core::config::{PersonalityConfig, PrinciplesConfig, RetrievalConfig};
use mnemos_core::models::{Memory, MemoryId};
use mnemos_core::traits::{Embedder, MemoryStore};
use mnemos_embeddings::StaticEmbedder;
use mnemos_linker::Linker;
use mnemos_llm::StaticLlmClient;
use mnemos_retrieval::RetrievalFrontEnd;
use mnemos_storage::{ConnectionPool, SqliteMemoryStore, SqliteRelationalStore, SqliteVectorStore};

/// When up to 50% of a result's `related_memories` ids are absent from
/// the store, retrieval still returns successfully rather than erroring.
#[tokio::test]
async fn up_to_half_dangling_links_does_not_fail_retrieval() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool.clone()));
    let embedder: Arc<dyn Embedder> = Arc::new(StaticEmbedder::new(8));
    let store = Arc::new(SqliteMemoryStore::new(vector_store.clone(), embedder.clone()));
    let relational = Arc::new(SqliteRelationalStore::new(pool));
    let llm = Arc::new(StaticLlmClient::new(""));

    let content = "a memory with half its links dangling";
    let embedding = embedder.embed(content).await.unwrap();
    let mut memory = Memory::new(content.to_string(), embedding, None);
    // Two real neighbours, two ids that were never stored — a 50% stale rate.
    let live_one = store
        .store(Memory::new("live neighbour one".to_string(), embedder.embed("live neighbour one").await.unwrap(), None))
        .await
        .unwrap();
    let live_two = store
        .store(Memory::new("live neighbour two".to_string(), embedder.embed("live neighbour two").await.unwrap(), None))
        .await
        .unwrap();
    let dangling_one = MemoryId::new();
    let dangling_two = MemoryId::new();
    memory.related_memories = vec![live_one, live_two, dangling_one, dangling_two];
    store.store(memory).await.unwrap();

    let front_end = RetrievalFrontEnd::new(
        store,
        vector_store,
        relational,
        embedder,
        llm,
        Linker::new(Default::default()),
        RetrievalConfig {
            max_memories: 5,
            min_score: 0.0,
            ..RetrievalConfig::default()
        },
        PersonalityConfig::default(),
        PrinciplesConfig::default(),
    );

    let result = front_end.retrieve(None, "a memory with half its links dangling").await;
    assert!(result.is_ok());
    let result = result.unwrap();
    assert!(!result.memories.is_empty());
}
