use async_trait::async_trait;
use mnemos_core::errors::LlmError;
use mnemos_core::traits::{ChatRequest, LlmClient, StreamEvent};
use tokio::sync::mpsc;

/// Deterministic test double. Replies with a fixed transform of the last
/// user message instead of calling a model, so test suites don't depend on
/// a live inference endpoint.
pub struct StaticLlmClient {
    reply_prefix: String,
}

impl StaticLlmClient {
    pub fn new(reply_prefix: impl Into<String>) -> Self {
        Self {
            reply_prefix: reply_prefix.into(),
        }
    }
}

impl Default for StaticLlmClient {
    fn default() -> Self {
        Self::new("echo:")
    }
}

fn last_user_content(request: &ChatRequest) -> &str {
    request
        .messages
        .iter()
        .rev()
        .find(|m| matches!(m.role, mnemos_core::traits::Role::User))
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

#[async_trait]
impl LlmClient for StaticLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        Ok(format!("{} {}", self.reply_prefix, last_user_content(&request)))
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<String, LlmError> {
        let full = self.chat(request).await?;
        for word in full.split_inclusive(' ') {
            let _ = tx.send(StreamEvent::Token(word.to_string())).await;
        }
        let _ = tx.send(StreamEvent::Finish).await;
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::traits::ChatMessage;

    #[tokio::test]
    async fn echoes_last_user_message() {
        let client = StaticLlmClient::default();
        let request = ChatRequest::new(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("hello there"),
        ]);
        let reply = client.chat(request).await.unwrap();
        assert_eq!(reply, "echo: hello there");
    }

    #[tokio::test]
    async fn stream_reassembles_to_the_same_text() {
        let client = StaticLlmClient::default();
        let request = ChatRequest::new(vec![ChatMessage::user("a b c")]);
        let (tx, mut rx) = mpsc::channel(16);
        let full = client.chat_stream(request, tx).await.unwrap();

        let mut reassembled = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::Token(t) => reassembled.push_str(&t),
                StreamEvent::Finish => break,
                StreamEvent::Reasoning(_) => {}
            }
        }
        assert_eq!(reassembled, full);
    }
}
