/// Compaction pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    #[error("cluster rewrite failed after retry: {0}")]
    ClusterRewriteFailed(String),

    #[error("compressor returned malformed output: {0}")]
    CompressorFormatError(String),

    #[error("tier capacity configuration invalid: {0}")]
    InvalidCapacityConfig(String),

    #[error("partial failure across {failed}/{total} clusters")]
    PartialFailure { failed: usize, total: usize },
}
