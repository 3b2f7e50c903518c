//! `RecordTurn(ctx, userID, userText, assistantText, retrievedIDs)`: the
//! write path a chat handler calls once a turn completes — stores the
//! exchange as a new memory (when it clears the minimum length
//! thresholds) and bumps validation on everything that was retrieved.

use mnemos_core::errors::MnemosError;
use mnemos_core::models::{Memory, MemoryId};
use mnemos_core::traits::MemoryStore;

use crate::front_end::RetrievalFrontEnd;

impl RetrievalFrontEnd {
    /// Writes the turn as a new Recent-tier memory and increments
    /// `validation_count` on every retrieved memory that fed the turn (it
    /// was not flagged bad, so it earns credit). Skipped entirely — no
    /// memory written, no validation bumped — when either side of the
    /// turn falls short of the configured minimum length.
    pub async fn record_turn(
        &self,
        user_id: Option<&str>,
        user_text: &str,
        assistant_text: &str,
        retrieved_ids: &[MemoryId],
    ) -> Result<Option<MemoryId>, MnemosError> {
        if user_text.len() < self.retrieval_config.min_content_length
            || assistant_text.len() < self.retrieval_config.min_response_length
        {
            return Ok(None);
        }

        let content = format!("User: {user_text}\nAssistant: {assistant_text}");
        let embedding = self.embedder.embed(&content).await?;
        let memory = Memory::new(content, embedding, user_id.map(str::to_string));
        let new_id = self.store.store(memory).await?;

        for &retrieved_id in retrieved_ids {
            self.store.increment_validation_count(retrieved_id).await?;
        }

        Ok(Some(new_id))
    }
}
