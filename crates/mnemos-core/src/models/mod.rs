mod dialogue_goal;
mod memory;
mod principle;
mod query;

pub use dialogue_goal::{DialogueGoal, GoalStatus};
pub use memory::{Memory, MemoryId, OutcomeTag, Tier};
pub use principle::{Principle, PrincipleSource};
pub use query::RetrievalQuery;
