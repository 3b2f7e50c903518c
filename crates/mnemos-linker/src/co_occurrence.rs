use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mnemos_core::config::LinkingConfig;
use mnemos_core::errors::StorageError;
use mnemos_core::models::MemoryId;
use mnemos_core::traits::MemoryStore;

use crate::graph::LinkGraph;

/// Unordered pair key so `(a, b)` and `(b, a)` hash to the same counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(MemoryId, MemoryId);

impl PairKey {
    pub fn new(a: MemoryId, b: MemoryId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CoOccurrenceEntry {
    count: u32,
    last_incremented_at: DateTime<Utc>,
}

/// Co-occurrence pair counters and the materialization threshold that turns
/// a counter into a visible `related_memories` link.
pub struct CoOccurrenceTracker {
    pairs: DashMap<PairKey, CoOccurrenceEntry>,
}

impl CoOccurrenceTracker {
    pub fn new() -> Self {
        Self { pairs: DashMap::new() }
    }

    /// Increment the counter for `(a, b)`, throttled so a burst of turns
    /// recalling the same pair within `throttle_minutes` only counts once.
    /// Returns the counter value after the increment, or `None` if the
    /// increment was throttled away.
    fn increment(&self, a: MemoryId, b: MemoryId, throttle_minutes: i64, now: DateTime<Utc>) -> Option<u32> {
        let key = PairKey::new(a, b);
        let mut entry = self.pairs.entry(key).or_insert(CoOccurrenceEntry {
            count: 0,
            last_incremented_at: DateTime::<Utc>::MIN_UTC,
        });

        let since_last = now.signed_duration_since(entry.last_incremented_at);
        if since_last < chrono::Duration::minutes(throttle_minutes) {
            return None;
        }

        entry.count += 1;
        entry.last_incremented_at = now;
        Some(entry.count)
    }

    fn count(&self, a: MemoryId, b: MemoryId) -> u32 {
        self.pairs.get(&PairKey::new(a, b)).map(|e| e.count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for CoOccurrenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Records that `a` and `b` were recalled together in the same turn. When
/// the pair's counter crosses `co_occurrence_link_threshold`, both memories'
/// `related_memories` are updated to include each other, evicting the
/// weakest existing neighbour (by graph edge weight) if already at
/// `max_links_per_memory`.
pub async fn track_co_occurrence(
    tracker: &CoOccurrenceTracker,
    graph: &LinkGraph,
    store: &dyn MemoryStore,
    config: &LinkingConfig,
    a: MemoryId,
    b: MemoryId,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    if a == b {
        return Ok(false);
    }

    let Some(count) = tracker.increment(a, b, config.co_occurrence_throttle_minutes, now) else {
        return Ok(false);
    };

    graph.set_edge(a, b, count as f64);

    if count < config.co_occurrence_link_threshold {
        return Ok(false);
    }

    materialize_link(graph, store, config, a, b).await?;
    materialize_link(graph, store, config, b, a).await?;
    Ok(true)
}

async fn materialize_link(
    graph: &LinkGraph,
    store: &dyn MemoryStore,
    config: &LinkingConfig,
    owner: MemoryId,
    new_neighbor: MemoryId,
) -> Result<(), StorageError> {
    let Some(memory) = store.get_by_id(owner).await? else {
        return Ok(());
    };

    let mut related = memory.related_memories;
    if related.contains(&new_neighbor) {
        return Ok(());
    }
    related.push(new_neighbor);

    if related.len() > config.max_links_per_memory {
        let weakest = related
            .iter()
            .copied()
            .min_by(|x, y| {
                let wx = graph.edge_weight(owner, *x).unwrap_or(0.0);
                let wy = graph.edge_weight(owner, *y).unwrap_or(0.0);
                wx.partial_cmp(&wy).unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("related is non-empty after push");
        related.retain(|id| *id != weakest);
    }

    store.update_links(owner, related, config.max_links_per_memory).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_rejects_second_increment_within_window() {
        let tracker = CoOccurrenceTracker::new();
        let a = MemoryId::new();
        let b = MemoryId::new();
        let t0 = Utc::now();

        assert_eq!(tracker.increment(a, b, 30, t0), Some(1));
        assert_eq!(tracker.increment(a, b, 30, t0 + chrono::Duration::minutes(5)), None);
        assert_eq!(tracker.count(a, b), 1);
    }

    #[test]
    fn increment_passes_once_throttle_window_elapses() {
        let tracker = CoOccurrenceTracker::new();
        let a = MemoryId::new();
        let b = MemoryId::new();
        let t0 = Utc::now();

        tracker.increment(a, b, 30, t0);
        let result = tracker.increment(a, b, 30, t0 + chrono::Duration::minutes(31));
        assert_eq!(result, Some(2));
    }

    #[test]
    fn pair_key_is_order_independent() {
        let a = MemoryId::new();
        let b = MemoryId::new();
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
    }
}
