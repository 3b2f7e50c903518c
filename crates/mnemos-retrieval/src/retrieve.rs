//! `Retrieve(ctx, userID, text) -> {systemPrompt, memories[], embedding}`:
//! the read path a chat handler calls on every turn.

use std::time::Duration;

use chrono::Utc;
use mnemos_core::errors::MnemosError;
use mnemos_core::models::RetrievalQuery;
use mnemos_core::traits::{MemoryStore, ScoredMemory};
use tracing::warn;

use crate::front_end::RetrievalFrontEnd;

/// Result of a `Retrieve` call: the personality system prompt, the ranked
/// memories that fed it, and the query embedding (reused by `RecordTurn`
/// so it needn't be computed twice).
#[derive(Debug, Clone)]
pub struct RetrieveResult {
    pub system_prompt: String,
    pub memories: Vec<ScoredMemory>,
    pub embedding: Vec<f32>,
}

impl RetrievalFrontEnd {
    /// Combines §4.2 search with §4.6 principles formatting under the
    /// configured deadline. A fraction of dangling `related_memories` ids
    /// is tolerated per Testable Property 8: missing ids are simply
    /// skipped with a warning rather than failing the call.
    pub async fn retrieve(&self, user_id: Option<&str>, text: &str) -> Result<RetrieveResult, MnemosError> {
        let deadline = Duration::from_millis(self.retrieval_config.deadline_ms);
        tokio::time::timeout(deadline, self.retrieve_inner(user_id, text))
            .await
            .map_err(|_| MnemosError::DeadlineExceeded {
                elapsed_ms: self.retrieval_config.deadline_ms,
            })?
    }

    async fn retrieve_inner(&self, user_id: Option<&str>, text: &str) -> Result<RetrieveResult, MnemosError> {
        let mut query = RetrievalQuery::new(text, self.retrieval_config.max_memories);
        query.user_id = user_id.map(str::to_string);
        query.min_score = self.retrieval_config.min_score;
        query.good_behaviour_bias = self.personality_config.good_behaviour_bias;

        let mut memories = self.store.search(&query).await?;
        self.warn_on_stale_links(&memories).await;
        self.expand_one_hop(&mut memories).await?;

        for scored in &memories {
            self.store.update_access_metadata(scored.memory.id).await?;
        }

        if memories.len() >= 2 {
            let now = Utc::now();
            for i in 0..memories.len() {
                for j in (i + 1)..memories.len() {
                    self.linker
                        .track_co_occurrence(self.store.as_ref(), memories[i].memory.id, memories[j].memory.id, now)
                        .await?;
                }
            }
        }

        let embedding = self.embedder.embed(text).await?;

        let slots = mnemos_principles::load_slots(self.relational.as_ref(), &self.principles_config).await?;
        let system_prompt =
            mnemos_principles::format_as_system_prompt(&slots, self.personality_config.good_behaviour_bias, Utc::now());

        Ok(RetrieveResult {
            system_prompt,
            memories,
            embedding,
        })
    }

    /// One-hop link expansion: appends each search hit's live
    /// `related_memories` neighbours (deduplicated against the existing
    /// result set) as zero-scored entries, capped at
    /// `max_linked_memories`.
    async fn expand_one_hop(&self, memories: &mut Vec<ScoredMemory>) -> Result<(), MnemosError> {
        let mut seen: std::collections::HashSet<_> = memories.iter().map(|s| s.memory.id).collect();
        let mut related_ids = Vec::new();
        for scored in memories.iter() {
            for &related_id in &scored.memory.related_memories {
                if seen.insert(related_id) {
                    related_ids.push(related_id);
                }
            }
        }
        related_ids.truncate(self.retrieval_config.max_linked_memories);
        if related_ids.is_empty() {
            return Ok(());
        }

        let linked = self.store.get_by_ids(&related_ids).await?;
        memories.extend(linked.into_iter().map(|memory| ScoredMemory { memory, score: 0.0 }));
        Ok(())
    }

    /// Counts how many ids across the result set's `related_memories` are
    /// absent from the store, warning (but never failing) when the
    /// fraction is non-trivial.
    async fn warn_on_stale_links(&self, memories: &[ScoredMemory]) {
        let mut total = 0usize;
        let mut stale = 0usize;
        for scored in memories {
            for &related_id in &scored.memory.related_memories {
                total += 1;
                match self.store.get_by_id(related_id).await {
                    Ok(None) => stale += 1,
                    Ok(Some(_)) => {}
                    Err(err) => warn!(error = %err, "stale-link check failed to query store"),
                }
            }
        }
        if total > 0 {
            let rate = stale as f64 / total as f64;
            if stale > 0 {
                warn!(stale, total, rate, "retrieved memories reference stale related_memories ids");
            }
        }
    }
}
