use mnemos_core::errors::StorageError;
use rusqlite::Connection;

use crate::to_storage_err;

/// Adds the reverse-lookup index compaction's link rerouting needs.
/// `delete_links_touching` still never scans it — this index only serves
/// `find_referencing`, which compaction calls deliberately and infrequently.
pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_memory_links_related ON memory_links (related_id);",
    )
    .map_err(to_storage_err)
}
