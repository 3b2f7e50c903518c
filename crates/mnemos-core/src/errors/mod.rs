mod compaction_error;
mod embedding_error;
mod llm_error;
mod mnemos_error;
mod principles_error;
mod storage_error;
mod tagging_error;

pub use compaction_error::CompactionError;
pub use embedding_error::EmbeddingError;
pub use llm_error::LlmError;
pub use mnemos_error::{MnemosError, MnemosResult};
pub use principles_error::PrinciplesError;
pub use storage_error::StorageError;
pub use tagging_error::TaggingError;
