use std::path::Path;
use std::sync::{Arc, Mutex};

use mnemos_core::errors::StorageError;
use rusqlite::Connection;
use tracing::info;

use crate::{migrations, to_storage_err};

/// A single write/read connection guarded by a blocking mutex, with WAL
/// mode enabled. Every call into the store adapters wraps its SQL in
/// `tokio::task::spawn_blocking` over a clone of this handle, so the async
/// runtime never blocks on disk I/O.
#[derive(Clone)]
pub struct ConnectionPool {
    conn: Arc<Mutex<Connection>>,
}

impl ConnectionPool {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref()).map_err(to_storage_err)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(to_storage_err)?;
        let applied = migrations::run_migrations(&conn)?;
        info!(applied, "mnemos-storage ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the guarded connection on a blocking thread.
    pub async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StorageError::BackendError("connection mutex poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StorageError::BackendError(format!("blocking task panicked: {e}")))?
    }
}
