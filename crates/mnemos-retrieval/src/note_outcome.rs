//! `NoteOutcome(ctx, retrievedIDs, outcome)`: applies a good/bad/neutral
//! signal to every memory that fed a turn, nudging `trust_score` by the
//! configured learning rate.

use mnemos_core::errors::MnemosError;
use mnemos_core::models::{MemoryId, OutcomeTag};
use mnemos_core::traits::MemoryStore;

use crate::front_end::RetrievalFrontEnd;

impl RetrievalFrontEnd {
    pub async fn note_outcome(&self, retrieved_ids: &[MemoryId], outcome: OutcomeTag) -> Result<(), MnemosError> {
        let rate = self.personality_config.trust_learning_rate;
        let delta = match outcome {
            OutcomeTag::Good => rate,
            OutcomeTag::Bad => -rate,
            OutcomeTag::Neutral => 0.0,
        };

        for &id in retrieved_ids {
            let Some(memory) = self.store.get_by_id(id).await? else {
                continue;
            };
            let trust_score = (memory.trust_score + delta).clamp(0.0, 1.0);
            self.store
                .update_tags(id, outcome, trust_score, memory.concept_tags)
                .await?;
        }
        Ok(())
    }
}
