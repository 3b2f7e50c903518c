//! Drives one full compaction pass across every tier: capacity check,
//! victim selection, clustering, compression, and rewrite — each cluster
//! failing independently of the rest.

use mnemos_core::config::{CompactionConfig, LinkingConfig, StorageConfig};
use mnemos_core::models::{Memory, MemoryId, Tier};
use mnemos_core::traits::{Embedder, LlmClient, MemoryStore};
use tracing::{info, warn};

use crate::capacity;
use crate::cluster::cluster_victims;
use crate::compressor::compress_cluster;
use crate::rewrite::{delete_cluster_members, rewrite_cluster, PendingDelete};
use crate::victim::select_victims;

/// Outcome of one `run_pass` call.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub clusters_processed: usize,
    pub clusters_failed: usize,
    pub records_removed: usize,
    /// Ids of successor records written this pass, so the caller can seed
    /// their `related_memories` from nearest neighbours.
    pub new_ids: Vec<MemoryId>,
    /// Successors whose originals failed to delete even after the
    /// in-pass retry budget; callers should persist these and retry via
    /// [`crate::rewrite::resume_pending_deletes`] on the next wake.
    pub unresolved_deletes: Vec<PendingDelete>,
}

fn merge_window_days(config: &CompactionConfig, tier: Tier) -> i64 {
    match tier {
        Tier::Recent => config.merge_window_recent_days as i64,
        Tier::Medium => config.merge_window_medium_days as i64,
        Tier::Long => config.merge_window_long_days as i64,
        // Ancient has no further promotion target, but victims still need a
        // window to cluster within; reuse the widest configured window.
        Tier::Ancient => config.merge_window_long_days as i64,
    }
}

/// One attempt at compression + rewrite for a single cluster, retried once
/// with backoff on compressor failure before the cluster is skipped.
async fn process_cluster(
    store: &dyn MemoryStore,
    embedder: &dyn Embedder,
    llm: &dyn LlmClient,
    cluster: &[Memory],
    target_tier: Tier,
    max_links: usize,
) -> Option<(MemoryId, Option<PendingDelete>)> {
    let mut attempt = 0;
    let compressed = loop {
        match compress_cluster(llm, cluster).await {
            Ok(c) => break c,
            Err(err) if attempt == 0 => {
                warn!(error = %err, "compressor failed, retrying once");
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                attempt += 1;
            }
            Err(err) => {
                warn!(error = %err, "compressor failed twice, skipping cluster");
                return None;
            }
        }
    };

    let (new_id, pending) = match rewrite_cluster(store, embedder, cluster, compressed, target_tier, max_links).await {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "cluster rewrite failed, skipping");
            return None;
        }
    };

    match delete_cluster_members(store, &pending, 3).await {
        Ok(()) => {
            info!(%new_id, members = pending.member_ids.len(), "cluster compressed");
            Some((new_id, None))
        }
        Err(err) => {
            warn!(%new_id, error = %err, "could not delete cluster originals, deferring");
            Some((new_id, Some(pending)))
        }
    }
}

/// Runs the tier capacity sweep: for every tier over its trigger line,
/// selects victims, clusters them, and rewrites each cluster.
pub async fn run_pass(
    store: &dyn MemoryStore,
    embedder: &dyn Embedder,
    llm: &dyn LlmClient,
    storage_config: &StorageConfig,
    compaction_config: &CompactionConfig,
    linking_config: &LinkingConfig,
) -> Result<PassSummary, mnemos_core::errors::StorageError> {
    let mut summary = PassSummary::default();

    let mut counts = std::collections::HashMap::new();
    for tier in Tier::all() {
        counts.insert(tier, store.count_by_tier(tier, None).await?);
    }

    for tier in Tier::all() {
        let Some(target_tier) = tier.promotion_target() else {
            continue;
        };

        let deficit = capacity::deficit(storage_config, &counts, tier);
        if deficit == 0 {
            continue;
        }

        let candidate_cap = (deficit as usize).saturating_mul(4).max(deficit as usize);
        let candidates = store.list_tier(tier, candidate_cap).await?;
        let victims = select_victims(candidates, storage_config.compression_weights, deficit);
        if victims.is_empty() {
            continue;
        }

        let clusters = cluster_victims(
            victims,
            compaction_config.similarity_threshold,
            merge_window_days(compaction_config, tier),
            compaction_config.max_cluster_size,
        );

        for cluster in &clusters {
            summary.clusters_processed += 1;
            match process_cluster(store, embedder, llm, cluster, target_tier, linking_config.max_links_per_memory).await {
                None => summary.clusters_failed += 1,
                Some((new_id, None)) => {
                    summary.records_removed += cluster.len();
                    summary.new_ids.push(new_id);
                }
                Some((new_id, Some(pending))) => {
                    summary.new_ids.push(new_id);
                    summary.unresolved_deletes.push(pending);
                }
            }
        }
    }

    Ok(summary)
}
