use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a `DialogueGoal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Open,
    InProgress,
    Completed,
    Abandoned,
}

/// Used only by the reflection hook; persisted in a relational store and
/// referenced from the core only through `crate::traits::DialogueGoalStore`.
/// No mining or scoring logic lives here — this is the storage contract
/// only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueGoal {
    pub id: String,
    pub description: String,
    pub source: String,
    pub priority: u32,
    pub created: DateTime<Utc>,
    pub progress: f64,
    pub status: GoalStatus,
    #[serde(default)]
    pub actions: Vec<String>,
}
