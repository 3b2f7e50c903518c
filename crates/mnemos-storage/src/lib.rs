//! SQLite persistence: `VectorStore`, `MemoryStore`, `RelationalStore`, and
//! `DialogueGoalStore` implementations over a single connection guarded by
//! a blocking mutex, with a forward-only migration runner.

pub mod migrations;
pub mod pool;
pub mod queries;

mod sqlite_memory_store;
mod sqlite_relational_store;
mod sqlite_vector_store;

pub use pool::ConnectionPool;
pub use sqlite_memory_store::SqliteMemoryStore;
pub use sqlite_relational_store::SqliteRelationalStore;
pub use sqlite_vector_store::SqliteVectorStore;

use mnemos_core::errors::StorageError;

/// Converts a rusqlite error into the crate's storage error type.
pub(crate) fn to_storage_err(err: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: err.to_string(),
    }
}
