use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mnemos_core::errors::StorageError;
use mnemos_core::models::{Memory, MemoryId, OutcomeTag, RetrievalQuery, Tier};
use mnemos_core::scoring::{rerank_score, RerankConstants};
use mnemos_core::traits::{Embedder, MemoryStore, ScoredMemory, VectorFilter, VectorStore};

/// The typed `M` API: embeds the query text, issues a kNN against the
/// vector store with headroom for re-ranking, then applies the shared
/// re-rank formula before truncating to the caller's limit.
pub struct SqliteMemoryStore {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    constants: RerankConstants,
}

impl SqliteMemoryStore {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            constants: RerankConstants::default(),
        }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn store(&self, memory: Memory) -> Result<MemoryId, StorageError> {
        if self.vector_store.get(memory.id).await?.is_some() {
            return Err(StorageError::DuplicateId {
                id: memory.id.to_string(),
            });
        }
        let id = memory.id;
        self.vector_store.upsert(&memory).await?;
        Ok(id)
    }

    async fn get_by_id(&self, id: MemoryId) -> Result<Option<Memory>, StorageError> {
        self.vector_store.get(id).await
    }

    async fn get_by_ids(&self, ids: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
        self.vector_store.get_many(ids).await
    }

    async fn search(&self, query: &RetrievalQuery) -> Result<Vec<ScoredMemory>, StorageError> {
        let query_embedding = self
            .embedder
            .embed(&query.text)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        let filter = VectorFilter {
            user_id: query.user_id.clone(),
            include_personal: query.include_personal,
            include_collective: query.include_collective,
            tier: None,
        };

        let headroom_k = query.limit.saturating_mul(3).max(query.limit);
        let candidates = self
            .vector_store
            .query(&query_embedding, headroom_k, &filter)
            .await?;

        let now = Utc::now();
        let mut scored: Vec<ScoredMemory> = candidates
            .into_iter()
            .filter(|(_, sim)| *sim >= query.min_score)
            .map(|(memory, sim)| {
                let score = rerank_score(
                    sim,
                    memory.outcome_tag,
                    memory.trust_score,
                    memory.last_accessed_at,
                    now,
                    query.good_behaviour_bias,
                    self.constants,
                );
                ScoredMemory { memory, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.memory.validation_count.cmp(&a.memory.validation_count))
                .then_with(|| a.memory.id.cmp(&b.memory.id))
        });
        scored.truncate(query.limit);
        Ok(scored)
    }

    async fn update_access_metadata(&self, id: MemoryId) -> Result<(), StorageError> {
        let mut memory = self
            .vector_store
            .get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        memory.access_count += 1;
        memory.last_accessed_at = Utc::now();
        self.vector_store.upsert(&memory).await
    }

    async fn increment_validation_count(&self, id: MemoryId) -> Result<(), StorageError> {
        let mut memory = self
            .vector_store
            .get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        memory.validation_count += 1;
        self.vector_store.upsert(&memory).await
    }

    async fn update_links(
        &self,
        id: MemoryId,
        related_ids: Vec<MemoryId>,
        max_links: usize,
    ) -> Result<(), StorageError> {
        let mut memory = self
            .vector_store
            .get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        memory.related_memories = related_ids;
        memory.clamp_links(max_links);
        self.vector_store.upsert(&memory).await
    }

    async fn delete(&self, ids: &[MemoryId]) -> Result<(), StorageError> {
        self.vector_store.delete(ids).await
    }

    async fn count_by_tier(&self, tier: Tier, user_id: Option<&str>) -> Result<u64, StorageError> {
        self.vector_store.count_by_tier(tier, user_id).await
    }

    async fn find_untagged(&self, limit: usize) -> Result<Vec<Memory>, StorageError> {
        self.vector_store.find_untagged(limit).await
    }

    async fn update_tags(
        &self,
        id: MemoryId,
        outcome_tag: OutcomeTag,
        trust_score: f64,
        concept_tags: Vec<String>,
    ) -> Result<(), StorageError> {
        let mut memory = self
            .vector_store
            .get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        memory.outcome_tag = outcome_tag;
        memory.trust_score = trust_score;
        memory.concept_tags = concept_tags;
        self.vector_store.upsert(&memory).await
    }

    async fn rewrite_content(
        &self,
        id: MemoryId,
        content: String,
        embedding: Vec<f32>,
    ) -> Result<(), StorageError> {
        let mut memory = self
            .vector_store
            .get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        memory.content = content;
        memory.embedding = embedding;
        self.vector_store.upsert(&memory).await
    }

    async fn find_referencing(&self, targets: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
        self.vector_store.find_referencing(targets).await
    }

    async fn list_tier(&self, tier: Tier, limit: usize) -> Result<Vec<Memory>, StorageError> {
        self.vector_store.list_tier(tier, limit).await
    }

    async fn find_good_by_priority(&self, limit: usize) -> Result<Vec<Memory>, StorageError> {
        self.vector_store.find_good_by_priority(limit).await
    }
}
