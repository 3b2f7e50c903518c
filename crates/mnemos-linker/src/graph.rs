use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mnemos_core::models::MemoryId;
use petgraph::graphmap::UnGraphMap;

/// Thread-safe in-process registry of live links, shared by the
/// co-occurrence, decay, and similarity-seed mechanisms. Edges carry the
/// current link strength (the co-occurrence counter, aged by decay).
///
/// Undirected by construction — a link means "these two recall together",
/// not "a causes b" — so there is no cycle check on insertion.
#[derive(Clone)]
pub struct LinkGraph {
    inner: Arc<RwLock<UnGraphMap<MemoryId, f64>>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(UnGraphMap::new())),
        }
    }

    pub fn set_edge(&self, a: MemoryId, b: MemoryId, weight: f64) {
        let mut graph = self.write();
        graph.add_edge(a, b, weight);
    }

    pub fn edge_weight(&self, a: MemoryId, b: MemoryId) -> Option<f64> {
        self.read().edge_weight(a, b).copied()
    }

    pub fn remove_edge(&self, a: MemoryId, b: MemoryId) -> bool {
        self.write().remove_edge(a, b).is_some()
    }

    pub fn neighbors(&self, id: MemoryId) -> Vec<(MemoryId, f64)> {
        let graph = self.read();
        graph
            .neighbors(id)
            .filter_map(|n| graph.edge_weight(id, n).map(|w| (n, *w)))
            .collect()
    }

    /// Snapshot of every edge, for the decay pass to walk.
    pub fn all_edges(&self) -> Vec<(MemoryId, MemoryId, f64)> {
        self.read()
            .all_edges()
            .map(|(a, b, w)| (a, b, *w))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.read().edge_count()
    }

    fn read(&self) -> RwLockReadGuard<'_, UnGraphMap<MemoryId, f64>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UnGraphMap<MemoryId, f64>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LinkGraph {
    fn default() -> Self {
        Self::new()
    }
}
