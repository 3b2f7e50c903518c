use std::time::Duration;

use async_trait::async_trait;
use mnemos_core::errors::LlmError;
use mnemos_core::traits::{ChatRequest, LlmClient, Role, StreamEvent};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// OpenAI-style `POST /chat/completions` client, streaming or not.
pub struct HttpLlmClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn payload(&self, request: &ChatRequest, stream: bool) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                serde_json::json!({ "role": role, "content": m.content })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
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

/// Pulls `Token`/`Reasoning` content out of one decoded SSE `data:` JSON
/// payload. Returns `None` for a payload carrying neither (e.g. a role-only
/// delta or a chunk with only `finish_reason` set).
fn decode_delta(json: &serde_json::Value) -> Option<StreamEvent> {
    let delta = json.get("choices")?.get(0)?.get("delta")?;
    if let Some(content) = delta.get("content").and_then(|v| v.as_str()) {
        if !content.is_empty() {
            return Some(StreamEvent::Token(content.to_string()));
        }
    }
    if let Some(reasoning) = delta.get("reasoning_content").and_then(|v| v.as_str()) {
        if !reasoning.is_empty() {
            return Some(StreamEvent::Reasoning(reasoning.to_string()));
        }
    }
    None
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        let body = self.payload(&request, false);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::TransportError(e.to_string()))?;

        let status = response.status();
        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::TransportError(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::FormatError {
                sample: truncate(&parsed.to_string()),
            });
        }

        parsed
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::FormatError {
                sample: truncate(&parsed.to_string()),
            })
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<String, LlmError> {
        let body = self.payload(&request, true);
        let mut response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::TransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let parsed: serde_json::Value = response
                .json()
                .await
                .map_err(|e| LlmError::TransportError(e.to_string()))?;
            return Err(LlmError::FormatError {
                sample: truncate(&parsed.to_string()),
            });
        }

        let mut accumulated = String::new();
        let mut reasoning_open = false;
        let mut carry = String::new();

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(c)) => c,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stream chunk read failed");
                    return Err(LlmError::TransportError(e.to_string()));
                }
            };
            carry.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = carry.find('\n') {
                let line = carry[..pos].trim().to_string();
                carry.drain(..=pos);
                if line.is_empty() {
                    continue;
                }
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    let _ = tx.send(StreamEvent::Finish).await;
                    return Ok(accumulated);
                }
                let parsed: serde_json::Value = match serde_json::from_str(data) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!(error = %e, sample = %truncate(data), "skipping malformed SSE frame");
                        continue;
                    }
                };
                match decode_delta(&parsed) {
                    Some(StreamEvent::Token(text)) => {
                        if reasoning_open {
                            accumulated.push_str("</think>");
                            reasoning_open = false;
                        }
                        accumulated.push_str(&text);
                        let _ = tx.send(StreamEvent::Token(text)).await;
                    }
                    Some(StreamEvent::Reasoning(text)) => {
                        if !reasoning_open {
                            accumulated.push_str("<think>");
                            reasoning_open = true;
                        }
                        accumulated.push_str(&text);
                        let _ = tx.send(StreamEvent::Reasoning(text)).await;
                    }
                    Some(StreamEvent::Finish) | None => {}
                }
            }
        }

        if reasoning_open {
            accumulated.push_str("</think>");
        }
        let _ = tx.send(StreamEvent::Finish).await;
        Ok(accumulated)
    }
}
