//! Chat-completion client with a unified SSE streaming decoder, a
//! deterministic test double, and an optional priority queue wrapper.

mod http_llm_client;
mod queue;
mod static_llm_client;

pub use http_llm_client::HttpLlmClient;
pub use queue::{Priority, PriorityLlmClient};
pub use static_llm_client::StaticLlmClient;
