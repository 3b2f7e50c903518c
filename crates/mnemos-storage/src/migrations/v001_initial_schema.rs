use mnemos_core::errors::StorageError;
use rusqlite::Connection;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS memories (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            tier TEXT NOT NULL,
            outcome_tag TEXT NOT NULL,
            trust_score REAL NOT NULL,
            validation_count INTEGER NOT NULL,
            importance_score REAL NOT NULL,
            access_count INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            last_accessed_at TEXT NOT NULL,
            concept_tags TEXT NOT NULL,
            user_id TEXT,
            is_collective INTEGER NOT NULL,
            metadata TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_memories_tier ON memories (tier);
        CREATE INDEX IF NOT EXISTS idx_memories_user ON memories (user_id);

        CREATE TABLE IF NOT EXISTS memory_links (
            memory_id TEXT NOT NULL,
            related_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (memory_id, related_id)
        );

        CREATE INDEX IF NOT EXISTS idx_memory_links_memory ON memory_links (memory_id, position);

        CREATE TABLE IF NOT EXISTS principles (
            slot INTEGER PRIMARY KEY,
            text TEXT NOT NULL,
            rating REAL NOT NULL,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_promoted_at TEXT NOT NULL,
            validation_count INTEGER NOT NULL,
            violation_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dialogue_goals (
            id TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            source TEXT NOT NULL,
            priority INTEGER NOT NULL,
            created TEXT NOT NULL,
            progress REAL NOT NULL,
            status TEXT NOT NULL,
            actions TEXT NOT NULL
        );
        ",
    )
    .map_err(to_storage_err)
}
