/// Storage subsystem errors (vector store adapter + relational store).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at v{version:03}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("duplicate id: {id}")]
    DuplicateId { id: String },

    #[error("backend error: {0}")]
    BackendError(String),
}
