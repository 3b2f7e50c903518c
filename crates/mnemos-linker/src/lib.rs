//! Associative linking: the three mechanisms that populate and prune
//! `Memory::related_memories` without a dedicated graph database — a
//! co-occurrence counter with throttling, similarity-seeded links for
//! freshly written records, and periodic decay.

mod co_occurrence;
mod decay;
mod graph;
mod similarity_seed;

pub use co_occurrence::{track_co_occurrence, CoOccurrenceTracker, PairKey};
pub use decay::{decay_pass, DecaySummary};
pub use graph::LinkGraph;
pub use similarity_seed::seed_similar_links;

use chrono::{DateTime, Utc};
use mnemos_core::config::LinkingConfig;
use mnemos_core::errors::StorageError;
use mnemos_core::models::{Memory, MemoryId};
use mnemos_core::traits::{MemoryStore, VectorStore};

/// Facade over the three linking mechanisms, holding the in-process pair
/// counters and edge registry they share.
pub struct Linker {
    tracker: CoOccurrenceTracker,
    graph: LinkGraph,
    config: LinkingConfig,
}

impl Linker {
    pub fn new(config: LinkingConfig) -> Self {
        Self {
            tracker: CoOccurrenceTracker::new(),
            graph: LinkGraph::new(),
            config,
        }
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    /// Records that `a` and `b` were recalled together, possibly
    /// materializing a mutual link once the pair's counter crosses the
    /// configured threshold.
    pub async fn track_co_occurrence(
        &self,
        store: &dyn MemoryStore,
        a: MemoryId,
        b: MemoryId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        track_co_occurrence(&self.tracker, &self.graph, store, &self.config, a, b, now).await
    }

    /// Seeds `fresh`'s `related_memories` from its nearest neighbours within
    /// its own tier, for use right after a compaction rewrite.
    pub async fn seed_similar_links(
        &self,
        vector_store: &dyn VectorStore,
        fresh: &Memory,
        k: usize,
    ) -> Result<Vec<MemoryId>, StorageError> {
        seed_similar_links(vector_store, fresh, self.config.similarity_threshold, k).await
    }

    /// Ages every live edge and drops those that fall below the configured
    /// floor.
    pub async fn decay(&self, store: &dyn MemoryStore) -> Result<DecaySummary, StorageError> {
        decay_pass(
            &self.graph,
            store,
            self.config.link_decay_rate,
            self.config.link_decay_floor,
            self.config.max_links_per_memory,
        )
        .await
    }

    pub fn tracked_pair_count(&self) -> usize {
        self.tracker.len()
    }
}
