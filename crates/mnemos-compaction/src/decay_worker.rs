//! Scheduling loop: wakes on a configurable period, coalesces concurrent
//! wakes with a try-lock, and drives the tier capacity sweep, tag
//! backfill, link decay, and principle evolution, strictly in that order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mnemos_core::config::{CompactionConfig, LinkingConfig, StorageConfig};
use mnemos_core::errors::MnemosError;
use mnemos_core::traits::{Embedder, LlmClient, MemoryStore, VectorStore};
use mnemos_linker::Linker;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::pass::{run_pass, PassSummary};
use crate::rewrite::{resume_pending_deletes, PendingDelete};

/// A unit of background work the worker drives alongside its own tier
/// sweep without depending on the crate that owns it — tag backfill
/// (`mnemos-tagger`) and principle evolution (`mnemos-principles`) are
/// injected this way so `mnemos-compaction` doesn't need either as a
/// dependency. Each implementation decides internally whether it is due
/// this wake (e.g. principle evolution checks its own sub-interval) and
/// no-ops otherwise.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self) -> Result<(), MnemosError>;
}

/// Drives one wake of the decay worker loop.
pub struct DecayWorker {
    store: Arc<dyn MemoryStore>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmClient>,
    linker: Linker,
    storage_config: StorageConfig,
    compaction_config: CompactionConfig,
    linking_config: LinkingConfig,
    /// Run between the tier sweep and link decay — e.g. tag backfill.
    tasks_before_link_decay: Vec<Arc<dyn ScheduledTask>>,
    /// Run after link decay — e.g. principle evolution.
    tasks_after_link_decay: Vec<Arc<dyn ScheduledTask>>,
    running: Mutex<()>,
    pending_deletes: Mutex<Vec<PendingDelete>>,
}

impl DecayWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        linker: Linker,
        storage_config: StorageConfig,
        compaction_config: CompactionConfig,
        linking_config: LinkingConfig,
        tasks_before_link_decay: Vec<Arc<dyn ScheduledTask>>,
        tasks_after_link_decay: Vec<Arc<dyn ScheduledTask>>,
    ) -> Self {
        Self {
            store,
            vector_store,
            embedder,
            llm,
            linker,
            storage_config,
            compaction_config,
            linking_config,
            tasks_before_link_decay,
            tasks_after_link_decay,
            running: Mutex::new(()),
            pending_deletes: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the periodic loop on the current tokio runtime. The returned
    /// handle's `JoinHandle` is dropped by the caller to detach it, or kept
    /// to abort on shutdown.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let schedule = Duration::from_secs(self.compaction_config.schedule_hours.max(1) * 3600);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(schedule);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.wake().await;
            }
        })
    }

    /// One wake: coalesces with any in-flight wake, retries carried-over
    /// deletes, then runs (a) the tier capacity sweep, (b) tag backfill,
    /// (c) link decay, (d) principle evolution, in that order.
    pub async fn wake(&self) {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("decay worker wake skipped, previous pass still running");
            return;
        };

        self.retry_pending_deletes().await;

        match self.run_tier_sweep().await {
            Ok(summary) => {
                info!(
                    processed = summary.clusters_processed,
                    failed = summary.clusters_failed,
                    removed = summary.records_removed,
                    "compaction pass complete"
                );
                self.seed_successors(&summary.new_ids).await;
                self.pending_deletes.lock().await.extend(summary.unresolved_deletes);
            }
            Err(err) => warn!(error = %err, "tier capacity sweep failed"),
        }

        for task in &self.tasks_before_link_decay {
            if let Err(err) = task.run().await {
                warn!(task = task.name(), error = %err, "scheduled task failed");
            }
        }

        match self.linker.decay(self.store.as_ref()).await {
            Ok(summary) => debug!(aged = summary.aged, dropped = summary.dropped, "link decay pass complete"),
            Err(err) => warn!(error = %err, "link decay pass failed"),
        }

        for task in &self.tasks_after_link_decay {
            if let Err(err) = task.run().await {
                warn!(task = task.name(), error = %err, "scheduled task failed");
            }
        }
    }

    /// Seeds each fresh successor's `related_memories` from its nearest
    /// neighbours, since compaction writes it in with an empty link list.
    async fn seed_successors(&self, new_ids: &[mnemos_core::models::MemoryId]) {
        for &id in new_ids {
            let Ok(Some(fresh)) = self.store.get_by_id(id).await else {
                continue;
            };
            match self
                .linker
                .seed_similar_links(self.vector_store.as_ref(), &fresh, self.linking_config.max_links_per_memory)
                .await
            {
                Ok(related) if !related.is_empty() => {
                    if let Err(err) = self
                        .store
                        .update_links(id, related, self.linking_config.max_links_per_memory)
                        .await
                    {
                        warn!(%id, error = %err, "failed to seed successor links");
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(%id, error = %err, "failed to seed successor links"),
            }
        }
    }

    async fn run_tier_sweep(&self) -> Result<PassSummary, mnemos_core::errors::StorageError> {
        run_pass(
            self.store.as_ref(),
            self.embedder.as_ref(),
            self.llm.as_ref(),
            &self.storage_config,
            &self.compaction_config,
            &self.linking_config,
        )
        .await
    }

    async fn retry_pending_deletes(&self) {
        let carried = std::mem::take(&mut *self.pending_deletes.lock().await);
        if carried.is_empty() {
            return;
        }
        let results = resume_pending_deletes(self.store.as_ref(), &carried, 3).await;
        let mut still_pending = self.pending_deletes.lock().await;
        for ((new_id, result), pending) in results.into_iter().zip(carried.into_iter()) {
            if let Err(err) = result {
                warn!(%new_id, error = %err, "carried-over delete still failing");
                still_pending.push(pending);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingTask {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ScheduledTask for CountingTask {
        fn name(&self) -> &str {
            "counting"
        }
        async fn run(&self) -> Result<(), MnemosError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn scheduled_task_trait_is_object_safe() {
        let task: Arc<dyn ScheduledTask> = Arc::new(CountingTask {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        assert_eq!(task.name(), "counting");
    }
}
