use async_trait::async_trait;
use mnemos_core::errors::StorageError;
use mnemos_core::models::{DialogueGoal, Principle};
use mnemos_core::traits::{DialogueGoalStore, RelationalStore};

use crate::pool::ConnectionPool;
use crate::queries::{goal_ops, principle_ops};

/// `principles` and `dialogue_goals` tables over the same connection pool
/// the vector/memory adapters share.
pub struct SqliteRelationalStore {
    pool: ConnectionPool,
}

impl SqliteRelationalStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationalStore for SqliteRelationalStore {
    async fn load_principles(&self) -> Result<Vec<Principle>, StorageError> {
        self.pool.with_conn(|conn| principle_ops::load_principles(conn)).await
    }

    async fn put_principle(&self, principle: Principle) -> Result<(), StorageError> {
        self.pool
            .with_conn(move |conn| principle_ops::put_principle(conn, &principle))
            .await
    }

    async fn clear_slot(&self, slot: u32) -> Result<(), StorageError> {
        self.pool.with_conn(move |conn| principle_ops::clear_slot(conn, slot)).await
    }
}

#[async_trait]
impl DialogueGoalStore for SqliteRelationalStore {
    async fn put_goal(&self, goal: DialogueGoal) -> Result<(), StorageError> {
        self.pool.with_conn(move |conn| goal_ops::put_goal(conn, &goal)).await
    }

    async fn get_goal(&self, id: &str) -> Result<Option<DialogueGoal>, StorageError> {
        let id = id.to_string();
        self.pool.with_conn(move |conn| goal_ops::get_goal(conn, &id)).await
    }

    async fn list_goals(&self) -> Result<Vec<DialogueGoal>, StorageError> {
        self.pool.with_conn(|conn| goal_ops::list_goals(conn)).await
    }
}
