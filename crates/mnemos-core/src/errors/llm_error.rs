/// LLM client subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("transport error calling inference endpoint: {0}")]
    TransportError(String),

    #[error("malformed completion response: {sample}")]
    FormatError { sample: String },

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("priority queue timeout at priority {priority}")]
    QueueTimeout { priority: String },
}
