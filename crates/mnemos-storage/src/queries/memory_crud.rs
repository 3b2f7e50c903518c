//! Insert, update, get, delete, and bulk ops for the `memories` table.

use chrono::{DateTime, Utc};
use mnemos_core::errors::StorageError;
use mnemos_core::models::{Memory, MemoryId, OutcomeTag, Tier};
use rusqlite::{params, Connection, OptionalExtension};

use crate::to_storage_err;

use super::{blob_to_embedding, embedding_to_blob, link_ops};

fn tier_to_str(tier: Tier) -> &'static str {
    tier.as_str()
}

fn tier_from_str(s: &str) -> Result<Tier, StorageError> {
    Tier::all()
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| StorageError::BackendError(format!("unknown tier '{s}'")))
}

fn outcome_to_str(tag: OutcomeTag) -> &'static str {
    match tag {
        OutcomeTag::Good => "good",
        OutcomeTag::Bad => "bad",
        OutcomeTag::Neutral => "neutral",
    }
}

fn outcome_from_str(s: &str) -> Result<OutcomeTag, StorageError> {
    match s {
        "good" => Ok(OutcomeTag::Good),
        "bad" => Ok(OutcomeTag::Bad),
        "neutral" => Ok(OutcomeTag::Neutral),
        other => Err(StorageError::BackendError(format!(
            "unknown outcome_tag '{other}'"
        ))),
    }
}

fn parse_dt(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::BackendError(format!("parse datetime '{s}': {e}")))
}

pub fn insert_memory(conn: &Connection, memory: &Memory) -> Result<(), StorageError> {
    let tags_json = serde_json::to_string(&memory.concept_tags).map_err(to_json_err)?;
    let metadata_json = serde_json::to_string(&memory.metadata).map_err(to_json_err)?;

    conn.execute(
        "INSERT INTO memories (
            id, content, embedding, tier, outcome_tag, trust_score, validation_count,
            importance_score, access_count, created_at, last_accessed_at, concept_tags,
            user_id, is_collective, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            memory.id.to_string(),
            memory.content,
            embedding_to_blob(&memory.embedding),
            tier_to_str(memory.tier),
            outcome_to_str(memory.outcome_tag),
            memory.trust_score,
            memory.validation_count,
            memory.importance_score,
            memory.access_count,
            memory.created_at.to_rfc3339(),
            memory.last_accessed_at.to_rfc3339(),
            tags_json,
            memory.user_id,
            memory.is_collective as i32,
            metadata_json,
        ],
    )
    .map_err(to_storage_err)?;

    link_ops::replace_links(conn, memory.id, &memory.related_memories)?;
    Ok(())
}

pub fn get_memory(conn: &Connection, id: MemoryId) -> Result<Option<Memory>, StorageError> {
    let row = conn
        .prepare(
            "SELECT id, content, embedding, tier, outcome_tag, trust_score, validation_count,
                    importance_score, access_count, created_at, last_accessed_at, concept_tags,
                    user_id, is_collective, metadata
             FROM memories WHERE id = ?1",
        )
        .map_err(to_storage_err)?
        .query_row(params![id.to_string()], row_to_memory)
        .optional()
        .map_err(to_storage_err)?;

    match row {
        Some(mut memory) => {
            memory.related_memories = link_ops::load_links(conn, id)?;
            Ok(Some(memory))
        }
        None => Ok(None),
    }
}

pub fn bulk_get(conn: &Connection, ids: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
    let mut results = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(memory) = get_memory(conn, id)? {
            results.push(memory);
        }
    }
    Ok(results)
}

pub fn update_access_metadata(conn: &Connection, id: MemoryId) -> Result<(), StorageError> {
    let rows = conn
        .execute(
            "UPDATE memories SET access_count = access_count + 1, last_accessed_at = ?2 WHERE id = ?1",
            params![id.to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(to_storage_err)?;
    if rows == 0 {
        return Err(StorageError::NotFound { id: id.to_string() });
    }
    Ok(())
}

pub fn increment_validation_count(conn: &Connection, id: MemoryId) -> Result<(), StorageError> {
    let rows = conn
        .execute(
            "UPDATE memories SET validation_count = validation_count + 1 WHERE id = ?1",
            params![id.to_string()],
        )
        .map_err(to_storage_err)?;
    if rows == 0 {
        return Err(StorageError::NotFound { id: id.to_string() });
    }
    Ok(())
}

pub fn delete_memories(conn: &Connection, ids: &[MemoryId]) -> Result<(), StorageError> {
    for &id in ids {
        link_ops::delete_links_touching(conn, id)?;
        conn.execute("DELETE FROM memories WHERE id = ?1", params![id.to_string()])
            .map_err(to_storage_err)?;
    }
    Ok(())
}

pub fn count_by_tier(
    conn: &Connection,
    tier: Tier,
    user_id: Option<&str>,
) -> Result<u64, StorageError> {
    let count: i64 = match user_id {
        Some(uid) => conn
            .query_row(
                "SELECT COUNT(*) FROM memories WHERE tier = ?1 AND user_id = ?2",
                params![tier_to_str(tier), uid],
                |row| row.get(0),
            )
            .map_err(to_storage_err)?,
        None => conn
            .query_row(
                "SELECT COUNT(*) FROM memories WHERE tier = ?1",
                params![tier_to_str(tier)],
                |row| row.get(0),
            )
            .map_err(to_storage_err)?,
    };
    Ok(count as u64)
}

/// Loads every memory, optionally filtered by tier and owner, for a brute-
/// force vector scan. Embeddings stay packed as `BLOB`s in SQLite; nothing
/// here builds an in-memory index, since the scan itself is the index.
pub fn scan_candidates(
    conn: &Connection,
    tier: Option<Tier>,
    user_id: Option<&str>,
    include_personal: bool,
    include_collective: bool,
) -> Result<Vec<Memory>, StorageError> {
    let mut sql = String::from(
        "SELECT id, content, embedding, tier, outcome_tag, trust_score, validation_count,
                importance_score, access_count, created_at, last_accessed_at, concept_tags,
                user_id, is_collective, metadata
         FROM memories WHERE 1=1",
    );
    if tier.is_some() {
        sql.push_str(" AND tier = ?1");
    }

    let mut stmt = conn.prepare(&sql).map_err(to_storage_err)?;
    let rows = if let Some(tier) = tier {
        stmt.query_map(params![tier_to_str(tier)], row_to_memory)
    } else {
        stmt.query_map([], row_to_memory)
    }
    .map_err(to_storage_err)?;

    let mut memories = Vec::new();
    for row in rows {
        let memory = row.map_err(to_storage_err)?;
        let owner_matches = memory.user_id.as_deref().is_some() && memory.user_id.as_deref() == user_id;
        let visible = (owner_matches && include_personal) || (memory.is_collective && include_collective);
        if visible {
            memories.push(memory);
        }
    }
    for memory in &mut memories {
        memory.related_memories = link_ops::load_links(conn, memory.id)?;
    }
    Ok(memories)
}

/// Records the tagger still needs to visit: neutral outcome tag or an
/// empty concept list.
pub fn find_untagged(conn: &Connection, limit: usize) -> Result<Vec<Memory>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, content, embedding, tier, outcome_tag, trust_score, validation_count,
                    importance_score, access_count, created_at, last_accessed_at, concept_tags,
                    user_id, is_collective, metadata
             FROM memories
             WHERE outcome_tag = 'neutral' OR concept_tags = '[]'
             ORDER BY created_at
             LIMIT ?1",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![limit as i64], row_to_memory)
        .map_err(to_storage_err)?;

    let mut memories = Vec::new();
    for row in rows {
        let mut memory = row.map_err(to_storage_err)?;
        memory.related_memories = link_ops::load_links(conn, memory.id)?;
        memories.push(memory);
    }
    Ok(memories)
}

/// Records in `tier`, oldest first, capped at `limit`. Used by compaction
/// to gather victim candidates; visibility filtering (owner/collective)
/// doesn't apply here since compaction operates store-wide.
pub fn list_by_tier(conn: &Connection, tier: Tier, limit: usize) -> Result<Vec<Memory>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, content, embedding, tier, outcome_tag, trust_score, validation_count,
                    importance_score, access_count, created_at, last_accessed_at, concept_tags,
                    user_id, is_collective, metadata
             FROM memories WHERE tier = ?1
             ORDER BY created_at
             LIMIT ?2",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![tier_to_str(tier), limit as i64], row_to_memory)
        .map_err(to_storage_err)?;

    let mut memories = Vec::new();
    for row in rows {
        let mut memory = row.map_err(to_storage_err)?;
        memory.related_memories = link_ops::load_links(conn, memory.id)?;
        memories.push(memory);
    }
    Ok(memories)
}

/// Good-tagged memories ordered by `trust_score * validation_count`
/// descending, capped at `limit`. Feeds principles mining extraction.
pub fn find_good_by_priority(conn: &Connection, limit: usize) -> Result<Vec<Memory>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, content, embedding, tier, outcome_tag, trust_score, validation_count,
                    importance_score, access_count, created_at, last_accessed_at, concept_tags,
                    user_id, is_collective, metadata
             FROM memories
             WHERE outcome_tag = 'good'
             ORDER BY trust_score * validation_count DESC
             LIMIT ?1",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![limit as i64], row_to_memory)
        .map_err(to_storage_err)?;

    let mut memories = Vec::new();
    for row in rows {
        let mut memory = row.map_err(to_storage_err)?;
        memory.related_memories = link_ops::load_links(conn, memory.id)?;
        memories.push(memory);
    }
    Ok(memories)
}

/// Full records of every memory with an outgoing link into `targets`, used
/// by compaction to reroute links onto a cluster's successor record.
pub fn find_referencing(conn: &Connection, targets: &[MemoryId]) -> Result<Vec<Memory>, StorageError> {
    let ids = link_ops::find_referencing_ids(conn, targets)?;
    let targets: std::collections::HashSet<_> = targets.iter().copied().collect();
    let referencing_ids: Vec<MemoryId> = ids.into_iter().filter(|id| !targets.contains(id)).collect();
    bulk_get(conn, &referencing_ids)
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let id_str: String = row.get(0)?;
    let embedding_blob: Vec<u8> = row.get(2)?;
    let tier_str: String = row.get(3)?;
    let outcome_str: String = row.get(4)?;
    let tags_json: String = row.get(11)?;
    let metadata_json: String = row.get(14)?;
    let created_at_str: String = row.get(9)?;
    let last_accessed_str: String = row.get(10)?;

    let to_sql_err = |e: StorageError| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
        )
    };

    Ok(Memory {
        id: id_str
            .parse()
            .map_err(|e: uuid::Error| to_sql_err(StorageError::BackendError(e.to_string())))?,
        content: row.get(1)?,
        embedding: blob_to_embedding(&embedding_blob),
        tier: tier_from_str(&tier_str).map_err(to_sql_err)?,
        outcome_tag: outcome_from_str(&outcome_str).map_err(to_sql_err)?,
        trust_score: row.get(5)?,
        validation_count: row.get(6)?,
        importance_score: row.get(7)?,
        access_count: row.get(8)?,
        created_at: parse_dt(&created_at_str).map_err(to_sql_err)?,
        last_accessed_at: parse_dt(&last_accessed_str).map_err(to_sql_err)?,
        related_memories: Vec::new(),
        concept_tags: serde_json::from_str(&tags_json)
            .map_err(|e| to_sql_err(StorageError::BackendError(e.to_string())))?,
        user_id: row.get(12)?,
        is_collective: row.get::<_, i32>(13)? != 0,
        metadata: serde_json::from_str(&metadata_json)
            .map_err(|e| to_sql_err(StorageError::BackendError(e.to_string())))?,
    })
}

fn to_json_err(e: serde_json::Error) -> StorageError {
    StorageError::BackendError(e.to_string())
}
