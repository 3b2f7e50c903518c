use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mnemos_compaction::run_pass;
use mnemos_core::config::storage_config::TierAllocation;
use mnemos_core::config::{CompactionConfig, LinkingConfig, StorageConfig};
use mnemos_core::errors::LlmError;
use mnemos_core::models::{Memory, Tier};
use mnemos_core::traits::{ChatRequest, Embedder, LlmClient, MemoryStore, StreamEvent};
use mnemos_embeddings::StaticEmbedder;
use mnemos_storage::{ConnectionPool, SqliteMemoryStore, SqliteVectorStore};
use tokio::sync::mpsc;

/// Always reports a fresh, distinct compressed record so every cluster the
/// pass assembles compresses successfully.
struct StubCompressorLlm;

#[async_trait]
impl LlmClient for StubCompressorLlm {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        let seed = request.messages.last().map(|m| m.content.len()).unwrap_or(0);
        Ok(format!("merged summary #{seed}\n---\ntags: carried"))
    }

    async fn chat_stream(&self, request: ChatRequest, tx: mpsc::Sender<StreamEvent>) -> Result<String, LlmError> {
        let reply = self.chat(request).await?;
        let _ = tx.send(StreamEvent::Token(reply.clone())).await;
        let _ = tx.send(StreamEvent::Finish).await;
        Ok(reply)
    }
}

/// A tier driven well past its trigger line is brought back to (or under)
/// its compression target once a pass runs, instead of growing unbounded.
#[tokio::test]
async fn tier_over_trigger_is_brought_under_target_after_pass() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool));
    let embedder: Arc<dyn Embedder> = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store, embedder.clone());

    let mut storage_config = StorageConfig {
        max_total_memories: 40,
        tier_allocation: TierAllocation {
            recent: 1.0,
            medium: 0.0,
            long: 0.0,
            ancient: 0.0,
        },
        ..StorageConfig::default()
    };
    storage_config.compression_trigger = 0.50;
    storage_config.compression_target = 0.25;

    // budget(Recent) = 40, trigger line = 20 records. Write well past it so
    // every written record clusters within the similarity + time window.
    let now = Utc::now();
    for i in 0..30u32 {
        let content = format!("shared topic note {i}");
        let embedding = embedder.embed(&content).await.unwrap();
        let mut memory = Memory::new(content, embedding, None);
        memory.created_at = now - Duration::hours(i as i64);
        memory.tier = Tier::Recent;
        store.store(memory).await.unwrap();
    }

    let before = store.count_by_tier(Tier::Recent, None).await.unwrap();
    assert_eq!(before, 30);

    let compaction_config = CompactionConfig {
        similarity_threshold: 0.0, // StaticEmbedder output isn't semantically discriminating; force clustering
        max_cluster_size: 8,
        ..CompactionConfig::default()
    };
    let linking_config = LinkingConfig::default();
    let llm = StubCompressorLlm;

    let summary = run_pass(&store, embedder.as_ref(), &llm, &storage_config, &compaction_config, &linking_config)
        .await
        .unwrap();

    assert!(summary.clusters_processed > 0);
    assert!(summary.records_removed > 0);
    assert!(summary.unresolved_deletes.is_empty());

    let after = store.count_by_tier(Tier::Recent, None).await.unwrap();
    let target_line = (storage_config.tier_budget(1.0) * storage_config.compression_target).ceil() as u64;
    assert!(after <= target_line, "expected at most {target_line} records, got {after}");
}

/// A tier under its trigger line is left untouched.
#[tokio::test]
async fn tier_under_trigger_is_left_alone() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool));
    let embedder: Arc<dyn Embedder> = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store, embedder.clone());

    let storage_config = StorageConfig {
        max_total_memories: 1000,
        ..StorageConfig::default()
    };

    for i in 0..5u32 {
        let content = format!("isolated note {i}");
        let embedding = embedder.embed(&content).await.unwrap();
        let memory = Memory::new(content, embedding, None);
        store.store(memory).await.unwrap();
    }

    let compaction_config = CompactionConfig::default();
    let linking_config = LinkingConfig::default();
    let llm = StubCompressorLlm;

    let summary = run_pass(&store, embedder.as_ref(), &llm, &storage_config, &compaction_config, &linking_config)
        .await
        .unwrap();

    assert_eq!(summary.clusters_processed, 0);
    assert_eq!(summary.records_removed, 0);
    assert_eq!(store.count_by_tier(Tier::Recent, None).await.unwrap(), 5);
}
