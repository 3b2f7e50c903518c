use std::sync::Arc;

use mnemos_core::models::{Memory, MemoryId, RetrievalQuery};
use mnemos_core::traits::{Embedder, MemoryStore, VectorStore};
use mnemos_embeddings::StaticEmbedder;
use mnemos_storage::{ConnectionPool, SqliteMemoryStore, SqliteVectorStore};

async fn new_memory(content: &str, embedder: &StaticEmbedder) -> Memory {
    let embedding = embedder.embed(content).await.unwrap();
    Memory::new(content.to_string(), embedding, None)
}

#[tokio::test]
async fn store_then_get_round_trips() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool));
    let embedder = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store.clone(), embedder.clone());

    let memory = new_memory("remember the deploy window", &embedder).await;
    let id = memory.id;
    store.store(memory.clone()).await.unwrap();

    let fetched = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(fetched.content, memory.content);
    assert_eq!(fetched.embedding, memory.embedding);
}

#[tokio::test]
async fn search_ranks_by_similarity_and_respects_limit() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool));
    let embedder = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store, embedder.clone());

    for i in 0..5 {
        let memory = new_memory(&format!("note number {i}"), &embedder).await;
        store.store(memory).await.unwrap();
    }

    let query = RetrievalQuery::new("note number 2", 3);
    let results = store.search(&query).await.unwrap();
    assert!(results.len() <= 3);
}

#[tokio::test]
async fn update_links_is_clamped_to_max_links() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool));
    let embedder = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store, embedder.clone());

    let memory = new_memory("hub memory", &embedder).await;
    let id = memory.id;
    store.store(memory).await.unwrap();

    let related: Vec<MemoryId> = (0..10).map(|_| MemoryId::new()).collect();
    store.update_links(id, related, 3).await.unwrap();

    let fetched = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(fetched.related_memories.len(), 3);
}
