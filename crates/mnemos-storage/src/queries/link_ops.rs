//! Associative link CRUD against `memory_links`.

use mnemos_core::errors::StorageError;
use mnemos_core::models::MemoryId;
use rusqlite::params;

use crate::to_storage_err;

/// Replaces every outgoing link for `id`, in order, clamped by the caller
/// before this is reached.
pub fn replace_links(
    conn: &rusqlite::Connection,
    id: MemoryId,
    related_ids: &[MemoryId],
) -> Result<(), StorageError> {
    conn.execute(
        "DELETE FROM memory_links WHERE memory_id = ?1",
        params![id.to_string()],
    )
    .map_err(to_storage_err)?;

    for (position, related) in related_ids.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO memory_links (memory_id, related_id, position) VALUES (?1, ?2, ?3)",
            params![id.to_string(), related.to_string(), position as i64],
        )
        .map_err(to_storage_err)?;
    }
    Ok(())
}

pub fn load_links(
    conn: &rusqlite::Connection,
    id: MemoryId,
) -> Result<Vec<MemoryId>, StorageError> {
    let mut stmt = conn
        .prepare("SELECT related_id FROM memory_links WHERE memory_id = ?1 ORDER BY position")
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![id.to_string()], |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;

    let mut ids = Vec::new();
    for row in rows {
        let raw = row.map_err(to_storage_err)?;
        if let Ok(parsed) = raw.parse() {
            ids.push(parsed);
        }
    }
    Ok(ids)
}

/// Distinct ids of memories that hold an outgoing link to any id in
/// `targets`. Backed by `idx_memory_links_related`. Unlike
/// `delete_links_touching`, this is an intentional reverse scan — compaction
/// calls it once per cluster rewrite, not on every delete.
pub fn find_referencing_ids(
    conn: &rusqlite::Connection,
    targets: &[MemoryId],
) -> Result<Vec<MemoryId>, StorageError> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = std::iter::repeat("?").take(targets.len()).collect::<Vec<_>>().join(",");
    let sql = format!(
        "SELECT DISTINCT memory_id FROM memory_links WHERE related_id IN ({placeholders})"
    );
    let target_strs: Vec<String> = targets.iter().map(|id| id.to_string()).collect();
    let params = rusqlite::params_from_iter(target_strs.iter());

    let mut stmt = conn.prepare(&sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params, |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;

    let mut ids = Vec::new();
    for row in rows {
        let raw = row.map_err(to_storage_err)?;
        if let Ok(parsed) = raw.parse() {
            ids.push(parsed);
        }
    }
    Ok(ids)
}

/// Deletes `id`'s own outgoing links. Other memories' links pointing at
/// `id` are left in place — they go stale rather than being swept, and
/// retrieval tolerates a bounded dangling-id rate rather than paying for
/// a reverse-index scan on every delete.
pub fn delete_links_touching(
    conn: &rusqlite::Connection,
    id: MemoryId,
) -> Result<(), StorageError> {
    conn.execute(
        "DELETE FROM memory_links WHERE memory_id = ?1",
        params![id.to_string()],
    )
    .map_err(to_storage_err)?;
    Ok(())
}
