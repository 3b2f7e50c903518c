use mnemos_core::errors::StorageError;
use mnemos_core::models::{Memory, MemoryId, Tier};
use mnemos_core::traits::{VectorFilter, VectorStore};

/// Top-K nearest neighbours of a freshly written record, restricted to its
/// own tier and `similarity_threshold`. Used by the decay worker right after
/// a rewrite to seed the successor's `related_memories` before co-occurrence
/// has had a chance to build any counters of its own.
pub async fn seed_similar_links(
    vector_store: &dyn VectorStore,
    fresh: &Memory,
    similarity_threshold: f64,
    k: usize,
) -> Result<Vec<MemoryId>, StorageError> {
    let filter = VectorFilter {
        user_id: fresh.user_id.clone(),
        include_personal: true,
        include_collective: true,
        tier: Some(fresh.tier),
    };

    let candidates = vector_store.query(&fresh.embedding, k + 1, &filter).await?;

    Ok(candidates
        .into_iter()
        .filter(|(candidate, sim)| candidate.id != fresh.id && *sim >= similarity_threshold)
        .take(k)
        .map(|(candidate, _)| candidate.id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeVectorStore {
        results: Mutex<Vec<(Memory, f64)>>,
    }

    #[async_trait]
    impl VectorStore for FakeVectorStore {
        async fn upsert(&self, _memory: &Memory) -> Result<(), StorageError> {
            Ok(())
        }
        async fn get(&self, _id: MemoryId) -> Result<Option<Memory>, StorageError> {
            Ok(None)
        }
        async fn get_many(&self, _ids: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
            Ok(Vec::new())
        }
        async fn query(
            &self,
            _query_embedding: &[f32],
            k: usize,
            _filter: &VectorFilter,
        ) -> Result<Vec<(Memory, f64)>, StorageError> {
            let mut results = self.results.lock().unwrap().clone();
            results.truncate(k);
            Ok(results)
        }
        async fn delete(&self, _ids: &[MemoryId]) -> Result<(), StorageError> {
            Ok(())
        }
        async fn count_by_tier(&self, _tier: Tier, _user_id: Option<&str>) -> Result<u64, StorageError> {
            Ok(0)
        }
        async fn find_untagged(&self, _limit: usize) -> Result<Vec<Memory>, StorageError> {
            Ok(Vec::new())
        }
        async fn find_referencing(&self, _targets: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
            Ok(Vec::new())
        }
        async fn list_tier(&self, _tier: Tier, _limit: usize) -> Result<Vec<Memory>, StorageError> {
            Ok(Vec::new())
        }
        async fn find_good_by_priority(&self, _limit: usize) -> Result<Vec<Memory>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn filters_below_threshold_and_excludes_self() {
        let fresh = Memory::new("fresh".to_string(), vec![1.0, 0.0], None);
        let below_threshold = Memory::new("weak match".to_string(), vec![0.1, 0.9], None);
        let strong_match = Memory::new("strong match".to_string(), vec![0.9, 0.1], None);

        let store = FakeVectorStore {
            results: Mutex::new(vec![
                (fresh.clone(), 1.0),
                (strong_match.clone(), 0.9),
                (below_threshold.clone(), 0.2),
            ]),
        };

        let seeded = seed_similar_links(&store, &fresh, 0.75, 5).await.unwrap();
        assert_eq!(seeded, vec![strong_match.id]);
    }
}
