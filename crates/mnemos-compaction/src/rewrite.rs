//! Cluster rewrite: builds the successor record, reroutes incoming links,
//! and deletes the cluster's originals.
//!
//! `delete_links_touching` (see `mnemos-storage`) deliberately never scans
//! for incoming references on an ordinary delete — dangling ids are a
//! tolerated, bounded condition there. This module is the one place that
//! *does* need the reverse direction: compaction knows exactly which ids
//! are about to disappear and the spec calls for a best-effort reroute at
//! this specific step, so it goes through `MemoryStore::find_referencing`
//! instead.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use mnemos_core::errors::StorageError;
use mnemos_core::models::{Memory, MemoryId, OutcomeTag, Tier};
use mnemos_core::traits::{Embedder, MemoryStore};
use tracing::warn;

use crate::compressor::CompressedCluster;

/// Key used to mark a successor record with the cluster it replaced, so a
/// resumed pass can recognize a write that already succeeded instead of
/// compressing the same cluster twice.
pub const SOURCE_MARKER_KEY: &str = "compaction_source_hash";

/// A successor record written but not yet confirmed to have had every
/// cluster member deleted. Kept by the caller across a pass so a later
/// resume can retry just the delete.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub new_id: MemoryId,
    pub member_ids: Vec<MemoryId>,
}

/// Per-target-tier erosion applied to the successor's `importance_score`,
/// reflecting that a merged record is less individually load-bearing than
/// any single member it replaced.
fn decay_factor(tier: Tier) -> f64 {
    match tier {
        Tier::Recent => 0.0,
        Tier::Medium => 0.1,
        Tier::Long => 0.2,
        Tier::Ancient => 0.3,
    }
}

/// Stable identifier for a cluster, independent of compressor output —
/// built from the sorted member ids rather than the (possibly
/// non-deterministic) compressed text, so retried compression with a
/// different result is still recognized as the same cluster.
fn cluster_marker(member_ids: &[MemoryId]) -> String {
    let mut ids: Vec<String> = member_ids.iter().map(|id| id.to_string()).collect();
    ids.sort();
    let mut hasher = DefaultHasher::new();
    ids.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn truncate_to_resolution(dt: DateTime<Utc>, target: Tier) -> DateTime<Utc> {
    match target {
        Tier::Recent => dt,
        Tier::Medium => Utc
            .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), 0, 0, 0)
            .single()
            .unwrap_or(dt),
        Tier::Long => Utc
            .with_ymd_and_hms(dt.year(), dt.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(dt),
        Tier::Ancient => Utc
            .with_ymd_and_hms(dt.year(), 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(dt),
    }
}

fn cluster_midpoint(cluster: &[Memory]) -> DateTime<Utc> {
    let oldest = cluster.iter().map(|m| m.created_at).min().unwrap();
    let newest = cluster.iter().map(|m| m.created_at).max().unwrap();
    oldest + (newest - oldest) / 2
}

fn dominant_outcome(cluster: &[Memory]) -> OutcomeTag {
    let mut weight: std::collections::HashMap<&'static str, f64> = std::collections::HashMap::new();
    for m in cluster {
        let w = m.trust_score * m.validation_count.max(1) as f64;
        let key = match m.outcome_tag {
            OutcomeTag::Good => "good",
            OutcomeTag::Bad => "bad",
            OutcomeTag::Neutral => "neutral",
        };
        *weight.entry(key).or_insert(0.0) += w;
    }
    let good = *weight.get("good").unwrap_or(&0.0);
    let bad = *weight.get("bad").unwrap_or(&0.0);
    if good > bad {
        OutcomeTag::Good
    } else if bad > good {
        OutcomeTag::Bad
    } else {
        OutcomeTag::Neutral
    }
}

fn weighted_trust(cluster: &[Memory]) -> f64 {
    let total_weight: f64 = cluster.iter().map(|m| m.validation_count.max(1) as f64).sum();
    if total_weight <= 0.0 {
        return 0.5;
    }
    cluster
        .iter()
        .map(|m| m.trust_score * m.validation_count.max(1) as f64)
        .sum::<f64>()
        / total_weight
}

fn build_successor(
    cluster: &[Memory],
    compressed: &CompressedCluster,
    embedding: Vec<f32>,
    target_tier: Tier,
) -> Memory {
    let created_at = truncate_to_resolution(cluster_midpoint(cluster), target_tier);
    let importance_score = cluster
        .iter()
        .map(|m| m.importance_score)
        .fold(0.0f64, f64::max)
        * (1.0 - decay_factor(target_tier));
    let validation_count = cluster.iter().map(|m| m.validation_count).sum();
    let user_id = cluster.first().and_then(|m| m.user_id.clone());
    let is_collective = cluster.iter().any(|m| m.is_collective);

    let member_ids: Vec<MemoryId> = cluster.iter().map(|m| m.id).collect();
    let mut metadata = std::collections::HashMap::new();
    metadata.insert(
        SOURCE_MARKER_KEY.to_string(),
        serde_json::Value::String(cluster_marker(&member_ids)),
    );

    Memory {
        id: MemoryId::new(),
        content: compressed.content.clone(),
        embedding,
        tier: target_tier,
        outcome_tag: dominant_outcome(cluster),
        trust_score: weighted_trust(cluster),
        validation_count,
        importance_score,
        access_count: 0,
        created_at,
        last_accessed_at: Utc::now(),
        related_memories: Vec::new(),
        concept_tags: compressed.concept_tags.clone(),
        user_id,
        is_collective,
        metadata,
    }
}

/// Rewrites one cluster: stores the successor, reroutes every referencing
/// record's links onto it, and deletes the cluster's members. Returns the
/// new id plus counts for logging; the delete step is retried by the
/// caller (see `pass.rs`) until it succeeds, recording a [`PendingDelete`]
/// in the meantime so a crash mid-delete can be resumed.
pub async fn rewrite_cluster(
    store: &dyn MemoryStore,
    embedder: &dyn Embedder,
    cluster: &[Memory],
    compressed: CompressedCluster,
    target_tier: Tier,
    max_links: usize,
) -> Result<(MemoryId, PendingDelete), StorageError> {
    let embedding = embedder
        .embed(&compressed.content)
        .await
        .map_err(|e| StorageError::BackendError(e.to_string()))?;

    let successor = build_successor(cluster, &compressed, embedding, target_tier);
    let new_id = successor.id;
    store.store(successor).await?;

    let member_ids: Vec<MemoryId> = cluster.iter().map(|m| m.id).collect();
    reroute_links(store, &member_ids, new_id, max_links).await?;

    Ok((
        new_id,
        PendingDelete {
            new_id,
            member_ids,
        },
    ))
}

/// For every record with an outgoing link into `member_ids`, rewrites that
/// link to point at `new_id` instead (deduplicated, clamped to
/// `max_links`).
async fn reroute_links(
    store: &dyn MemoryStore,
    member_ids: &[MemoryId],
    new_id: MemoryId,
    max_links: usize,
) -> Result<(), StorageError> {
    let referencing = store.find_referencing(member_ids).await?;
    for record in referencing {
        let mut rerouted: Vec<MemoryId> = record
            .related_memories
            .iter()
            .copied()
            .map(|id| if member_ids.contains(&id) { new_id } else { id })
            .collect();
        rerouted.dedup();
        store.update_links(record.id, rerouted, max_links).await?;
    }
    Ok(())
}

/// Deletes a cluster's originals, retrying with exponential backoff until
/// it succeeds — per spec, a delete failure after a successful write must
/// not be abandoned, only retried.
pub async fn delete_cluster_members(
    store: &dyn MemoryStore,
    pending: &PendingDelete,
    max_attempts: u32,
) -> Result<(), StorageError> {
    let mut attempt = 0;
    loop {
        match store.delete(&pending.member_ids).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt + 1 >= max_attempts => return Err(err),
            Err(err) => {
                warn!(attempt, new_id = %pending.new_id, error = %err, "delete of cluster members failed, retrying");
                let backoff_ms = 50u64 * 2u64.saturating_pow(attempt);
                tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Retries the delete step for every pending successor left over from an
/// interrupted pass.
pub async fn resume_pending_deletes(
    store: &dyn MemoryStore,
    pending: &[PendingDelete],
    max_attempts: u32,
) -> Vec<(MemoryId, Result<(), StorageError>)> {
    let mut results = Vec::with_capacity(pending.len());
    for p in pending {
        let outcome = delete_cluster_members(store, p, max_attempts).await;
        results.push((p.new_id, outcome));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_marker_is_order_independent() {
        let a = MemoryId::new();
        let b = MemoryId::new();
        assert_eq!(cluster_marker(&[a, b]), cluster_marker(&[b, a]));
    }

    #[test]
    fn dominant_outcome_picks_higher_weighted_side() {
        let mut good = Memory::new("g".to_string(), vec![0.0], None);
        good.outcome_tag = OutcomeTag::Good;
        good.trust_score = 0.9;
        good.validation_count = 10;

        let mut bad = Memory::new("b".to_string(), vec![0.0], None);
        bad.outcome_tag = OutcomeTag::Bad;
        bad.trust_score = 0.5;
        bad.validation_count = 1;

        assert_eq!(dominant_outcome(&[good, bad]), OutcomeTag::Good);
    }

    #[test]
    fn dominant_outcome_ties_to_neutral() {
        let mut good = Memory::new("g".to_string(), vec![0.0], None);
        good.outcome_tag = OutcomeTag::Good;
        good.trust_score = 0.5;
        good.validation_count = 2;

        let mut bad = Memory::new("b".to_string(), vec![0.0], None);
        bad.outcome_tag = OutcomeTag::Bad;
        bad.trust_score = 0.5;
        bad.validation_count = 2;

        assert_eq!(dominant_outcome(&[good, bad]), OutcomeTag::Neutral);
    }

    #[test]
    fn truncate_to_resolution_medium_zeroes_time() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 15, 13, 45, 0).unwrap();
        let truncated = truncate_to_resolution(dt, Tier::Medium);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn truncate_to_resolution_ancient_zeroes_to_year_start() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 15, 13, 45, 0).unwrap();
        let truncated = truncate_to_resolution(dt, Tier::Ancient);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
