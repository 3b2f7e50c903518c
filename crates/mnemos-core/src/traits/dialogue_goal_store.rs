use async_trait::async_trait;

use crate::errors::StorageError;
use crate::models::DialogueGoal;

/// Storage contract for `DialogueGoal`, referenced from the core only
/// through this opaque interface. No mining or scoring logic is
/// implemented against it — that belongs to the reflection hook, out of
/// scope here.
#[async_trait]
pub trait DialogueGoalStore: Send + Sync {
    async fn put_goal(&self, goal: DialogueGoal) -> Result<(), StorageError>;

    async fn get_goal(&self, id: &str) -> Result<Option<DialogueGoal>, StorageError>;

    async fn list_goals(&self) -> Result<Vec<DialogueGoal>, StorageError>;
}
