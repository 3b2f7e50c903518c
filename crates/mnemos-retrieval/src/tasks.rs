//! `ScheduledTask` adapters wrapping the tagger and principles engine so
//! `mnemos-compaction`'s `DecayWorker` can drive them without depending on
//! either crate directly (see SPEC_FULL.md §4.3's wake ordering).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mnemos_compaction::ScheduledTask;
use mnemos_core::errors::MnemosError;
use mnemos_core::traits::{Embedder, LlmClient, MemoryStore, RelationalStore};
use mnemos_principles::PrinciplesEngine;
use mnemos_tagger::Tagger;
use tokio::sync::Mutex;
use tracing::info;

/// Drives one `Tagger::run_batch` pass per wake.
pub struct TaggingTask {
    tagger: Tagger,
    store: Arc<dyn MemoryStore>,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
}

impl TaggingTask {
    pub fn new(batch_size: usize, store: Arc<dyn MemoryStore>, llm: Arc<dyn LlmClient>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            tagger: Tagger::new(batch_size),
            store,
            llm,
            embedder,
        }
    }
}

#[async_trait]
impl ScheduledTask for TaggingTask {
    fn name(&self) -> &str {
        "tag-backfill"
    }

    async fn run(&self) -> Result<(), MnemosError> {
        let summary = self
            .tagger
            .run_batch(self.store.as_ref(), self.llm.as_ref(), self.embedder.as_ref())
            .await?;
        info!(visited = summary.visited, tagged = summary.tagged, rejected = summary.rejected, "tag backfill pass complete");
        Ok(())
    }
}

/// Drives `PrinciplesEngine::evolve`, but only once its own
/// `evolution_schedule_hours` sub-interval has elapsed relative to the
/// decay worker's (typically shorter) wake period.
pub struct PrinciplesTask {
    engine: PrinciplesEngine,
    memory_store: Arc<dyn MemoryStore>,
    relational: Arc<dyn RelationalStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmClient>,
    schedule: Duration,
    last_run: Mutex<Option<chrono::DateTime<Utc>>>,
}

impl PrinciplesTask {
    pub fn new(
        engine: PrinciplesEngine,
        memory_store: Arc<dyn MemoryStore>,
        relational: Arc<dyn RelationalStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        evolution_schedule_hours: u64,
    ) -> Self {
        Self {
            engine,
            memory_store,
            relational,
            embedder,
            llm,
            schedule: Duration::from_secs(evolution_schedule_hours.max(1) * 3600),
            last_run: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ScheduledTask for PrinciplesTask {
    fn name(&self) -> &str {
        "principles-evolve"
    }

    async fn run(&self) -> Result<(), MnemosError> {
        let now = Utc::now();
        {
            let mut last_run = self.last_run.lock().await;
            let due = match *last_run {
                Some(previous) => now.signed_duration_since(previous).to_std().unwrap_or(Duration::ZERO) >= self.schedule,
                None => true,
            };
            if !due {
                return Ok(());
            }
            *last_run = Some(now);
        }

        let summary = self
            .engine
            .evolve(self.memory_store.as_ref(), self.relational.as_ref(), self.embedder.as_ref(), self.llm.as_ref())
            .await?;
        info!(mined = summary.candidates_mined, assigned = summary.candidates_assigned, "principles evolution pass complete");
        Ok(())
    }
}
