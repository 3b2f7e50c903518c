use async_trait::async_trait;

use crate::errors::StorageError;
use crate::models::{Memory, MemoryId, Tier};

/// Metadata filter applied alongside a vector kNN query.
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub user_id: Option<String>,
    pub include_personal: bool,
    pub include_collective: bool,
    pub tier: Option<Tier>,
}

/// Upserts/deletes/queries points by id, by vector similarity with
/// metadata filters, and by batched id.
///
/// Dimensions are fixed at store creation and never change; an
/// implementation that detects a mismatch returns
/// `StorageError::BackendError` (mapped to `MnemosError::EmbeddingMismatch`
/// by callers).
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, memory: &Memory) -> Result<(), StorageError>;

    async fn get(&self, id: MemoryId) -> Result<Option<Memory>, StorageError>;

    /// Batched lookup. Missing ids are simply absent from the result.
    async fn get_many(&self, ids: &[MemoryId]) -> Result<Vec<Memory>, StorageError>;

    /// Vector kNN with a metadata filter. Returns up to `k` candidates with
    /// their raw cosine similarity, unsorted-by-score is acceptable — the
    /// caller re-ranks.
    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &VectorFilter,
    ) -> Result<Vec<(Memory, f64)>, StorageError>;

    async fn delete(&self, ids: &[MemoryId]) -> Result<(), StorageError>;

    async fn count_by_tier(&self, tier: Tier, user_id: Option<&str>) -> Result<u64, StorageError>;

    /// Records still missing a non-neutral `outcome_tag` or any
    /// `concept_tags`, oldest first, capped at `limit`.
    async fn find_untagged(&self, limit: usize) -> Result<Vec<Memory>, StorageError>;

    /// Every record holding an outgoing link into `targets`. Used by
    /// compaction to reroute links onto a cluster's successor; not used on
    /// the ordinary delete path, which tolerates dangling links instead.
    async fn find_referencing(&self, targets: &[MemoryId]) -> Result<Vec<Memory>, StorageError>;

    /// Records in `tier`, oldest first, capped at `limit`. Used by
    /// compaction to gather victim candidates store-wide.
    async fn list_tier(&self, tier: Tier, limit: usize) -> Result<Vec<Memory>, StorageError>;

    /// Good-tagged records ordered by `trust_score * validation_count`
    /// descending, capped at `limit`. Feeds principles mining extraction.
    async fn find_good_by_priority(&self, limit: usize) -> Result<Vec<Memory>, StorageError>;
}
