//! Migration runner — version tracking, forward-only, transactional per migration.

mod v001_initial_schema;
mod v002_link_reverse_index;

use mnemos_core::errors::StorageError;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::to_storage_err;

pub const LATEST_VERSION: u32 = 2;

type MigrationFn = fn(&Connection) -> Result<(), StorageError>;

const MIGRATIONS: [(u32, &str, MigrationFn); 2] = [
    (1, "initial_schema", v001_initial_schema::migrate),
    (2, "link_reverse_index", v002_link_reverse_index::migrate),
];

/// Current schema version, or 0 if `schema_version` doesn't exist yet.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(to_storage_err)?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(to_storage_err)
}

/// Runs all pending migrations, each in its own transaction. Returns the
/// number applied.
pub fn run_migrations(conn: &Connection) -> Result<u32, StorageError> {
    let current = current_version(conn)?;
    let mut applied = 0;

    if current >= LATEST_VERSION {
        debug!(current, "schema up to date");
        return Ok(0);
    }

    info!(from = current, to = LATEST_VERSION, "running migrations");

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        conn.execute_batch("BEGIN IMMEDIATE").map_err(|e| {
            StorageError::MigrationFailed {
                version,
                reason: format!("begin transaction: {e}"),
            }
        })?;

        match migrate_fn(conn) {
            Ok(()) => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                    .map_err(|e| StorageError::MigrationFailed {
                        version,
                        reason: format!("record version: {e}"),
                    })?;
                conn.execute_batch("COMMIT")
                    .map_err(|e| StorageError::MigrationFailed {
                        version,
                        reason: format!("commit: {e}"),
                    })?;
                info!(version, name, "applied migration");
                applied += 1;
            }
            Err(e) => {
                warn!(version, name, error = %e, "migration failed, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(StorageError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(applied, now_at = LATEST_VERSION, "migrations complete");
    Ok(applied)
}
