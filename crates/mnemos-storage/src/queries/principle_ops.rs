//! CRUD for the `principles` table, one row per occupied slot.

use chrono::{DateTime, Utc};
use mnemos_core::errors::StorageError;
use mnemos_core::models::{Principle, PrincipleSource};
use rusqlite::params;

use crate::to_storage_err;

fn source_to_str(source: PrincipleSource) -> &'static str {
    match source {
        PrincipleSource::Admin => "admin",
        PrincipleSource::Mined => "mined",
    }
}

fn source_from_str(s: &str) -> Result<PrincipleSource, StorageError> {
    match s {
        "admin" => Ok(PrincipleSource::Admin),
        "mined" => Ok(PrincipleSource::Mined),
        other => Err(StorageError::BackendError(format!(
            "unknown principle source '{other}'"
        ))),
    }
}

fn parse_dt(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::BackendError(format!("parse datetime '{s}': {e}")))
}

pub fn load_principles(conn: &rusqlite::Connection) -> Result<Vec<Principle>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT slot, text, rating, source, created_at, last_promoted_at,
                    validation_count, violation_count
             FROM principles ORDER BY slot",
        )
        .map_err(to_storage_err)?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)? as u32,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)? as u64,
                row.get::<_, i64>(7)? as u64,
            ))
        })
        .map_err(to_storage_err)?;

    let mut principles = Vec::new();
    for row in rows {
        let (slot, text, rating, source, created_at, last_promoted_at, validation_count, violation_count) =
            row.map_err(to_storage_err)?;
        principles.push(Principle {
            slot,
            text,
            rating,
            source: source_from_str(&source)?,
            created_at: parse_dt(&created_at)?,
            last_promoted_at: parse_dt(&last_promoted_at)?,
            validation_count,
            violation_count,
        });
    }
    Ok(principles)
}

pub fn put_principle(conn: &rusqlite::Connection, principle: &Principle) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO principles (slot, text, rating, source, created_at, last_promoted_at,
                                  validation_count, violation_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(slot) DO UPDATE SET
            text = excluded.text,
            rating = excluded.rating,
            source = excluded.source,
            last_promoted_at = excluded.last_promoted_at,
            validation_count = excluded.validation_count,
            violation_count = excluded.violation_count",
        params![
            principle.slot,
            principle.text,
            principle.rating,
            source_to_str(principle.source),
            principle.created_at.to_rfc3339(),
            principle.last_promoted_at.to_rfc3339(),
            principle.validation_count,
            principle.violation_count,
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn clear_slot(conn: &rusqlite::Connection, slot: u32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM principles WHERE slot = ?1", params![slot])
        .map_err(to_storage_err)?;
    Ok(())
}
