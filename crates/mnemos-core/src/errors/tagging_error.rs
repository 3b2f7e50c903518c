/// Tagger reply interpretation errors — surfaced when an LLM reply, even
/// after the S-expression cleaner pass, still can't be trusted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaggingError {
    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("confidence missing or outside [0,1]")]
    InvalidConfidence,

    #[error("missing required clause: {0}")]
    MissingClause(String),
}
