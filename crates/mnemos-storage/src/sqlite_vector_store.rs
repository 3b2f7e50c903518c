use async_trait::async_trait;
use mnemos_core::errors::StorageError;
use mnemos_core::models::{Memory, MemoryId, Tier};
use mnemos_core::scoring::cosine_similarity;
use mnemos_core::traits::{VectorFilter, VectorStore};

use crate::pool::ConnectionPool;
use crate::queries::memory_crud;

/// Brute-force cosine-similarity scan over the `memories` table. No ANN
/// index: at the record counts this system is sized for, a full scan
/// filtered by tier/owner first is simpler and fast enough.
pub struct SqliteVectorStore {
    pool: ConnectionPool,
}

impl SqliteVectorStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, memory: &Memory) -> Result<(), StorageError> {
        let memory = memory.clone();
        self.pool
            .with_conn(move |conn| {
                conn.execute("DELETE FROM memories WHERE id = ?1", [memory.id.to_string()])
                    .map_err(crate::to_storage_err)?;
                memory_crud::insert_memory(conn, &memory)
            })
            .await
    }

    async fn get(&self, id: MemoryId) -> Result<Option<Memory>, StorageError> {
        self.pool
            .with_conn(move |conn| memory_crud::get_memory(conn, id))
            .await
    }

    async fn get_many(&self, ids: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
        let ids = ids.to_vec();
        self.pool
            .with_conn(move |conn| memory_crud::bulk_get(conn, &ids))
            .await
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: &VectorFilter,
    ) -> Result<Vec<(Memory, f64)>, StorageError> {
        let query_embedding = query_embedding.to_vec();
        let filter = filter.clone();
        self.pool
            .with_conn(move |conn| {
                let candidates = memory_crud::scan_candidates(
                    conn,
                    filter.tier,
                    filter.user_id.as_deref(),
                    filter.include_personal,
                    filter.include_collective,
                )?;
                let mut scored: Vec<(Memory, f64)> = candidates
                    .into_iter()
                    .map(|m| {
                        let sim = cosine_similarity(&query_embedding, &m.embedding);
                        (m, sim)
                    })
                    .collect();
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                scored.truncate(k);
                Ok(scored)
            })
            .await
    }

    async fn delete(&self, ids: &[MemoryId]) -> Result<(), StorageError> {
        let ids = ids.to_vec();
        self.pool
            .with_conn(move |conn| memory_crud::delete_memories(conn, &ids))
            .await
    }

    async fn count_by_tier(&self, tier: Tier, user_id: Option<&str>) -> Result<u64, StorageError> {
        let user_id = user_id.map(str::to_string);
        self.pool
            .with_conn(move |conn| memory_crud::count_by_tier(conn, tier, user_id.as_deref()))
            .await
    }

    async fn find_untagged(&self, limit: usize) -> Result<Vec<Memory>, StorageError> {
        self.pool
            .with_conn(move |conn| memory_crud::find_untagged(conn, limit))
            .await
    }

    async fn find_referencing(&self, targets: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
        let targets = targets.to_vec();
        self.pool
            .with_conn(move |conn| memory_crud::find_referencing(conn, &targets))
            .await
    }

    async fn list_tier(&self, tier: Tier, limit: usize) -> Result<Vec<Memory>, StorageError> {
        self.pool
            .with_conn(move |conn| memory_crud::list_by_tier(conn, tier, limit))
            .await
    }

    async fn find_good_by_priority(&self, limit: usize) -> Result<Vec<Memory>, StorageError> {
        self.pool
            .with_conn(move |conn| memory_crud::find_good_by_priority(conn, limit))
            .await
    }
}
