use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::errors::LlmError;
use mnemos_core::traits::{ChatRequest, LlmClient, StreamEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Critical,
    Normal,
    Background,
}

enum Job {
    Chat {
        request: ChatRequest,
        reply: oneshot::Sender<Result<String, LlmError>>,
    },
    Stream {
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
        reply: oneshot::Sender<Result<String, LlmError>>,
    },
}

/// Opt-in wrapper that funnels every call through one worker task draining
/// three channels priority-first (`critical` before `normal` before
/// `background`), so a burst of low-priority background calls can't starve
/// a critical one. Off the hot path unless explicitly constructed.
pub struct PriorityLlmClient {
    critical_tx: mpsc::Sender<Job>,
    normal_tx: mpsc::Sender<Job>,
    background_tx: mpsc::Sender<Job>,
}

impl PriorityLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, channel_capacity: usize) -> Self {
        let (critical_tx, mut critical_rx) = mpsc::channel::<Job>(channel_capacity);
        let (normal_tx, mut normal_rx) = mpsc::channel::<Job>(channel_capacity);
        let (background_tx, mut background_rx) = mpsc::channel::<Job>(channel_capacity);

        tokio::spawn(async move {
            loop {
                let job = tokio::select! {
                    biased;
                    Some(job) = critical_rx.recv() => job,
                    Some(job) = normal_rx.recv() => job,
                    Some(job) = background_rx.recv() => job,
                    else => break,
                };

                match job {
                    Job::Chat { request, reply } => {
                        let result = inner.chat(request).await;
                        if reply.send(result).is_err() {
                            debug!("priority queue caller dropped before chat reply delivered");
                        }
                    }
                    Job::Stream { request, tx, reply } => {
                        let result = inner.chat_stream(request, tx).await;
                        if reply.send(result).is_err() {
                            debug!("priority queue caller dropped before stream reply delivered");
                        }
                    }
                }
            }
        });

        Self {
            critical_tx,
            normal_tx,
            background_tx,
        }
    }

    fn sender_for(&self, priority: Priority) -> &mpsc::Sender<Job> {
        match priority {
            Priority::Critical => &self.critical_tx,
            Priority::Normal => &self.normal_tx,
            Priority::Background => &self.background_tx,
        }
    }

    pub async fn chat_with_priority(
        &self,
        request: ChatRequest,
        priority: Priority,
    ) -> Result<String, LlmError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender_for(priority)
            .send(Job::Chat {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LlmError::QueueTimeout {
                priority: tag(priority).to_string(),
            })?;
        reply_rx.await.map_err(|_| LlmError::QueueTimeout {
            priority: tag(priority).to_string(),
        })?
    }

    pub async fn chat_stream_with_priority(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
        priority: Priority,
    ) -> Result<String, LlmError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender_for(priority)
            .send(Job::Stream {
                request,
                tx,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LlmError::QueueTimeout {
                priority: tag(priority).to_string(),
            })?;
        reply_rx.await.map_err(|_| LlmError::QueueTimeout {
            priority: tag(priority).to_string(),
        })?
    }
}

fn tag(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "critical",
        Priority::Normal => "normal",
        Priority::Background => "background",
    }
}

#[async_trait]
impl LlmClient for PriorityLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.chat_with_priority(request, Priority::Normal).await
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<String, LlmError> {
        self.chat_stream_with_priority(request, tx, Priority::Normal)
            .await
    }
}
