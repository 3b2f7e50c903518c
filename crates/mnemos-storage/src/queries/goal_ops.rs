//! CRUD for the `dialogue_goals` table.

use chrono::{DateTime, Utc};
use mnemos_core::errors::StorageError;
use mnemos_core::models::{DialogueGoal, GoalStatus};
use rusqlite::{params, OptionalExtension};

use crate::to_storage_err;

fn status_to_str(status: GoalStatus) -> &'static str {
    match status {
        GoalStatus::Open => "open",
        GoalStatus::InProgress => "inprogress",
        GoalStatus::Completed => "completed",
        GoalStatus::Abandoned => "abandoned",
    }
}

fn status_from_str(s: &str) -> Result<GoalStatus, StorageError> {
    match s {
        "open" => Ok(GoalStatus::Open),
        "inprogress" => Ok(GoalStatus::InProgress),
        "completed" => Ok(GoalStatus::Completed),
        "abandoned" => Ok(GoalStatus::Abandoned),
        other => Err(StorageError::BackendError(format!(
            "unknown goal status '{other}'"
        ))),
    }
}

fn parse_dt(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::BackendError(format!("parse datetime '{s}': {e}")))
}

pub fn put_goal(conn: &rusqlite::Connection, goal: &DialogueGoal) -> Result<(), StorageError> {
    let actions_json = serde_json::to_string(&goal.actions)
        .map_err(|e| StorageError::BackendError(e.to_string()))?;
    conn.execute(
        "INSERT INTO dialogue_goals (id, description, source, priority, created, progress, status, actions)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            description = excluded.description,
            priority = excluded.priority,
            progress = excluded.progress,
            status = excluded.status,
            actions = excluded.actions",
        params![
            goal.id,
            goal.description,
            goal.source,
            goal.priority,
            goal.created.to_rfc3339(),
            goal.progress,
            status_to_str(goal.status),
            actions_json,
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn get_goal(conn: &rusqlite::Connection, id: &str) -> Result<Option<DialogueGoal>, StorageError> {
    conn.prepare(
        "SELECT id, description, source, priority, created, progress, status, actions
         FROM dialogue_goals WHERE id = ?1",
    )
    .map_err(to_storage_err)?
    .query_row(params![id], row_to_goal)
    .optional()
    .map_err(to_storage_err)?
    .transpose()
}

pub fn list_goals(conn: &rusqlite::Connection) -> Result<Vec<DialogueGoal>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, description, source, priority, created, progress, status, actions
             FROM dialogue_goals ORDER BY priority DESC, created",
        )
        .map_err(to_storage_err)?;
    let rows = stmt.query_map([], row_to_goal).map_err(to_storage_err)?;

    let mut goals = Vec::new();
    for row in rows {
        goals.push(row.map_err(to_storage_err)??);
    }
    Ok(goals)
}

fn row_to_goal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<DialogueGoal, StorageError>> {
    let id: String = row.get(0)?;
    let description: String = row.get(1)?;
    let source: String = row.get(2)?;
    let priority: u32 = row.get(3)?;
    let created_str: String = row.get(4)?;
    let progress: f64 = row.get(5)?;
    let status_str: String = row.get(6)?;
    let actions_json: String = row.get(7)?;

    let built = (|| -> Result<DialogueGoal, StorageError> {
        Ok(DialogueGoal {
            id,
            description,
            source,
            priority,
            created: parse_dt(&created_str)?,
            progress,
            status: status_from_str(&status_str)?,
            actions: serde_json::from_str(&actions_json)
                .map_err(|e| StorageError::BackendError(e.to_string()))?,
        })
    })();
    Ok(built)
}
