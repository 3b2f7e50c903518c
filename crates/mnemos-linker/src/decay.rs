use mnemos_core::errors::StorageError;
use mnemos_core::traits::MemoryStore;

use crate::graph::LinkGraph;

/// Outcome of one decay sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecaySummary {
    pub aged: usize,
    pub dropped: usize,
}

/// Ages every edge weight by `decay_rate` and drops edges that fall below
/// `floor`, removing the dropped neighbour from both endpoints'
/// `related_memories` via `MemoryStore::update_links`.
pub async fn decay_pass(
    graph: &LinkGraph,
    store: &dyn MemoryStore,
    decay_rate: f64,
    floor: f64,
    max_links: usize,
) -> Result<DecaySummary, StorageError> {
    let mut summary = DecaySummary::default();

    for (a, b, weight) in graph.all_edges() {
        let aged = weight * decay_rate;
        summary.aged += 1;

        if aged >= floor {
            graph.set_edge(a, b, aged);
            continue;
        }

        graph.remove_edge(a, b);
        summary.dropped += 1;
        drop_link(store, a, b, max_links).await?;
        drop_link(store, b, a, max_links).await?;
    }

    Ok(summary)
}

async fn drop_link(
    store: &dyn MemoryStore,
    owner: mnemos_core::models::MemoryId,
    dropped: mnemos_core::models::MemoryId,
    max_links: usize,
) -> Result<(), StorageError> {
    let Some(memory) = store.get_by_id(owner).await? else {
        return Ok(());
    };
    if !memory.related_memories.contains(&dropped) {
        return Ok(());
    }
    let remaining: Vec<_> = memory
        .related_memories
        .into_iter()
        .filter(|id| *id != dropped)
        .collect();
    store.update_links(owner, remaining, max_links).await
}
