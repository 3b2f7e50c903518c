use async_trait::async_trait;

use crate::errors::StorageError;
use crate::models::{Memory, MemoryId, OutcomeTag, RetrievalQuery, Tier};

/// A scored search hit.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub score: f64,
}

/// Typed API on top of the vector store adapter.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Assigns an id if absent, writes the record. Fails with `Conflict` if
    /// the id already exists.
    async fn store(&self, memory: Memory) -> Result<MemoryId, StorageError>;

    async fn get_by_id(&self, id: MemoryId) -> Result<Option<Memory>, StorageError>;

    async fn get_by_ids(&self, ids: &[MemoryId]) -> Result<Vec<Memory>, StorageError>;

    /// Biased similarity search: vector kNN followed by the re-rank
    /// formula in [`crate::scoring`].
    async fn search(&self, query: &RetrievalQuery) -> Result<Vec<ScoredMemory>, StorageError>;

    async fn update_access_metadata(&self, id: MemoryId) -> Result<(), StorageError>;

    async fn increment_validation_count(&self, id: MemoryId) -> Result<(), StorageError>;

    /// Replaces `related_memories` atomically, clamped to
    /// `max_links_per_memory`.
    async fn update_links(
        &self,
        id: MemoryId,
        related_ids: Vec<MemoryId>,
        max_links: usize,
    ) -> Result<(), StorageError>;

    async fn delete(&self, ids: &[MemoryId]) -> Result<(), StorageError>;

    async fn count_by_tier(&self, tier: Tier, user_id: Option<&str>) -> Result<u64, StorageError>;

    /// Records still missing a non-neutral `outcome_tag` or any
    /// `concept_tags`, oldest first, capped at `limit`.
    async fn find_untagged(&self, limit: usize) -> Result<Vec<Memory>, StorageError>;

    /// Applied by the tagger once an LLM judgment is accepted.
    async fn update_tags(
        &self,
        id: MemoryId,
        outcome_tag: OutcomeTag,
        trust_score: f64,
        concept_tags: Vec<String>,
    ) -> Result<(), StorageError>;

    /// Replaces `content` and `embedding` in place, preserving every other
    /// field. Used when the tagger normalizes wording on a record it is
    /// also judging.
    async fn rewrite_content(
        &self,
        id: MemoryId,
        content: String,
        embedding: Vec<f32>,
    ) -> Result<(), StorageError>;

    /// Every record holding an outgoing link into `targets`. Used by
    /// compaction to reroute links onto a cluster's successor.
    async fn find_referencing(&self, targets: &[MemoryId]) -> Result<Vec<Memory>, StorageError>;

    /// Records in `tier`, oldest first, capped at `limit`. Used by
    /// compaction to gather victim candidates store-wide.
    async fn list_tier(&self, tier: Tier, limit: usize) -> Result<Vec<Memory>, StorageError>;

    /// Good-tagged records ordered by `trust_score * validation_count`
    /// descending, capped at `limit`. Feeds principles mining extraction.
    async fn find_good_by_priority(&self, limit: usize) -> Result<Vec<Memory>, StorageError>;
}
