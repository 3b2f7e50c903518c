use std::time::Duration;

use async_trait::async_trait;
use mnemos_core::errors::EmbeddingError;
use mnemos_core::traits::Embedder;
use tracing::{debug, warn};

/// Calls an external HTTP embedding endpoint and parses `data[0].embedding`
/// from the response.
///
/// Retries at most once on a transient transport failure before
/// surfacing the error.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, dimensions: usize, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self {
            client,
            endpoint: endpoint.into(),
            dimensions,
        }
    }

    async fn call_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "input": text }))
            .send()
            .await
            .map_err(|e| EmbeddingError::TransportError(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::TransportError(e.to_string()))?;

        if !status.is_success() {
            return Err(EmbeddingError::FormatError {
                sample: truncate(&body.to_string()),
            });
        }

        let embedding = body
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbeddingError::FormatError {
                sample: truncate(&body.to_string()),
            })?;

        embedding
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| EmbeddingError::FormatError {
                sample: truncate(&body.to_string()),
            })
    }
}

fn truncate(sample: &str) -> String {
    const MAX: usize = 200;
    if sample.len() > MAX {
        format!("{}...", &sample[..MAX])
    } else {
        sample.to_string()
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        match self.call_once(text).await {
            Ok(v) => Ok(v),
            Err(EmbeddingError::TransportError(reason)) => {
                warn!(%reason, "embedding call failed, retrying once");
                self.call_once(text).await
            }
            Err(e) => {
                debug!(%e, "embedding call failed with non-retryable error");
                Err(e)
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
