/// Embedder subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("transport error calling embedding endpoint: {0}")]
    TransportError(String),

    #[error("malformed embedding response: {sample}")]
    FormatError { sample: String },

    #[error("empty input text")]
    EmptyInput,
}
