use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::config::PrinciplesConfig;
use mnemos_core::errors::LlmError;
use mnemos_core::models::{Memory, OutcomeTag, Principle};
use mnemos_core::traits::{ChatRequest, Embedder, LlmClient, MemoryStore, RelationalStore, StreamEvent};
use mnemos_embeddings::StaticEmbedder;
use mnemos_principles::PrinciplesEngine;
use mnemos_storage::{ConnectionPool, SqliteMemoryStore, SqliteRelationalStore, SqliteVectorStore};
use tokio::sync::mpsc;

struct FixedReplyLlm {
    reply: String,
}

#[async_trait]
impl LlmClient for FixedReplyLlm {
    async fn chat(&self, _request: ChatRequest) -> Result<String, LlmError> {
        Ok(self.reply.clone())
    }
    async fn chat_stream(&self, _request: ChatRequest, tx: mpsc::Sender<StreamEvent>) -> Result<String, LlmError> {
        let _ = tx.send(StreamEvent::Token(self.reply.clone())).await;
        let _ = tx.send(StreamEvent::Finish).await;
        Ok(self.reply.clone())
    }
}

/// Admin slots are never touched by Evolve(), and total occupied slots
/// never exceed `admin_slots + ai_managed_slots`.
#[tokio::test]
async fn admin_slots_survive_evolve_and_total_occupancy_is_bounded() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool.clone()));
    let embedder: Arc<dyn Embedder> = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store, embedder.clone());
    let relational = SqliteRelationalStore::new(pool);

    relational.put_principle(Principle::new_admin(1, "be honest")).await.unwrap();
    relational.put_principle(Principle::new_admin(2, "protect privacy")).await.unwrap();

    for i in 0..5u32 {
        let content = format!("a good outcome worth mining #{i}");
        let embedding = embedder.embed(&content).await.unwrap();
        let mut memory = Memory::new(content, embedding, None);
        memory.outcome_tag = OutcomeTag::Good;
        memory.trust_score = 0.9;
        memory.validation_count = 5;
        store.store(memory).await.unwrap();
    }

    let config = PrinciplesConfig {
        admin_slots: 2,
        ai_managed_slots: 3,
        min_rating_threshold: 0.3,
        extraction_limit: 200,
        ..PrinciplesConfig::default()
    };
    let engine = PrinciplesEngine::new(config.clone());
    let llm = FixedReplyLlm {
        reply: r#"(rule "always double-check facts" 0.8) (rule "ask before acting" 0.6)"#.to_string(),
    };

    let summary = engine.evolve(&store, &relational, embedder.as_ref(), &llm).await.unwrap();
    assert!(summary.candidates_assigned > 0);

    let principles = relational.load_principles().await.unwrap();
    let admin_one = principles.iter().find(|p| p.slot == 1).unwrap();
    let admin_two = principles.iter().find(|p| p.slot == 2).unwrap();
    assert_eq!(admin_one.text, "be honest");
    assert_eq!(admin_two.text, "protect privacy");
    assert!(admin_one.is_admin());
    assert!(admin_two.is_admin());

    assert!(principles.len() as u32 <= config.total_slots());
    assert!(principles.iter().all(|p| p.slot <= config.total_slots()));
}

/// A candidate rated below `min_rating_threshold` never occupies a slot.
#[tokio::test]
async fn below_threshold_candidates_are_never_assigned() {
    let pool = ConnectionPool::open_in_memory().unwrap();
    let vector_store = Arc::new(SqliteVectorStore::new(pool.clone()));
    let embedder: Arc<dyn Embedder> = Arc::new(StaticEmbedder::new(16));
    let store = SqliteMemoryStore::new(vector_store, embedder.clone());
    let relational = SqliteRelationalStore::new(pool);

    let content = "a single good memory";
    let embedding = embedder.embed(content).await.unwrap();
    let mut memory = Memory::new(content.to_string(), embedding, None);
    memory.outcome_tag = OutcomeTag::Good;
    memory.trust_score = 0.9;
    memory.validation_count = 3;
    store.store(memory).await.unwrap();

    let config = PrinciplesConfig {
        admin_slots: 0,
        ai_managed_slots: 2,
        min_rating_threshold: 0.95,
        ..PrinciplesConfig::default()
    };
    let engine = PrinciplesEngine::new(config);
    let llm = FixedReplyLlm {
        reply: r#"(rule "low confidence rule" 0.4)"#.to_string(),
    };

    let summary = engine.evolve(&store, &relational, embedder.as_ref(), &llm).await.unwrap();
    assert_eq!(summary.candidates_assigned, 0);
    assert!(relational.load_principles().await.unwrap().is_empty());
}
