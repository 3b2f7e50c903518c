//! Deterministic victim clustering: union-find over cosine similarity +
//! temporal proximity, with oversized clusters split to a cap.

use chrono::Duration;
use mnemos_core::models::Memory;
use mnemos_core::scoring::cosine_similarity;

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Groups `victims` into clusters: two records merge if their cosine
/// similarity is at least `similarity_threshold` and their `created_at`
/// values fall within `merge_window_days` of each other. Sorted by id
/// before union-find so the resulting partition is independent of input
/// order; each cluster is further sorted by `created_at` (oldest first)
/// and capped at `max_cluster_size`, splitting overflow into additional
/// clusters of the same key.
pub fn cluster_victims(
    mut victims: Vec<Memory>,
    similarity_threshold: f64,
    merge_window_days: i64,
    max_cluster_size: usize,
) -> Vec<Vec<Memory>> {
    victims.sort_by_key(|m| m.id);
    let n = victims.len();
    if n == 0 {
        return Vec::new();
    }

    let mut uf = UnionFind::new(n);
    let window = Duration::days(merge_window_days).num_seconds();

    for i in 0..n {
        for j in (i + 1)..n {
            let gap = (victims[i].created_at - victims[j].created_at).num_seconds().abs();
            if gap > window {
                continue;
            }
            let sim = cosine_similarity(&victims[i].embedding, &victims[j].embedding);
            if sim >= similarity_threshold {
                uf.union(i, j);
            }
        }
    }

    let mut groups: std::collections::BTreeMap<usize, Vec<Memory>> = std::collections::BTreeMap::new();
    for (i, memory) in victims.into_iter().enumerate() {
        let root = uf.find(i);
        groups.entry(root).or_default().push(memory);
    }

    let mut clusters = Vec::new();
    for (_, mut group) in groups {
        group.sort_by_key(|m| m.created_at);
        if group.is_empty() {
            continue;
        }
        for chunk in group.chunks(max_cluster_size.max(1)) {
            clusters.push(chunk.to_vec());
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn memory_with(embedding: Vec<f32>, age_days: i64) -> Memory {
        let mut m = Memory::new("x".to_string(), embedding, None);
        m.created_at = Utc::now() - Duration::days(age_days);
        m
    }

    #[test]
    fn similar_and_close_memories_cluster_together() {
        let a = memory_with(vec![1.0, 0.0], 10);
        let b = memory_with(vec![0.99, 0.01], 11);
        let c = memory_with(vec![0.0, 1.0], 10);

        let clusters = cluster_victims(vec![a.clone(), b.clone(), c.clone()], 0.9, 30, 16);
        assert_eq!(clusters.len(), 2);
        let sizes: Vec<usize> = clusters.iter().map(|c| c.len()).collect();
        assert!(sizes.contains(&2));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn outside_merge_window_stays_separate_despite_similarity() {
        let a = memory_with(vec![1.0, 0.0], 1);
        let b = memory_with(vec![1.0, 0.0], 100);
        let clusters = cluster_victims(vec![a, b], 0.9, 5, 16);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn clustering_is_order_independent() {
        let a = memory_with(vec![1.0, 0.0], 5);
        let b = memory_with(vec![0.95, 0.05], 6);
        let c = memory_with(vec![0.9, 0.1], 7);

        let forward = cluster_victims(vec![a.clone(), b.clone(), c.clone()], 0.8, 30, 16);
        let reversed = cluster_victims(vec![c, b, a], 0.8, 30, 16);

        let mut forward_sizes: Vec<usize> = forward.iter().map(|c| c.len()).collect();
        let mut reversed_sizes: Vec<usize> = reversed.iter().map(|c| c.len()).collect();
        forward_sizes.sort();
        reversed_sizes.sort();
        assert_eq!(forward_sizes, reversed_sizes);
    }

    #[test]
    fn oversized_cluster_is_split_at_cap() {
        let memories: Vec<Memory> = (0..20).map(|i| memory_with(vec![1.0, 0.0], i)).collect();
        let clusters = cluster_victims(memories, 0.9, 365, 16);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 16);
        assert_eq!(clusters[1].len(), 4);
    }
}
