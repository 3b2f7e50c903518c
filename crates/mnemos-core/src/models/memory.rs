use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque 128-bit identifier, globally unique. Newtype around a UUID so the
/// rest of the crate doesn't leak the representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryId(pub uuid::Uuid);

impl MemoryId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MemoryId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

/// Coarseness tier. Transitions happen only through compaction writes.
/// A fifth logical tier, Principles, is stored separately and has no
/// `Memory` representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Recent,
    Medium,
    Long,
    Ancient,
}

impl Tier {
    /// The tier a record is promoted into on compaction, if any.
    pub fn promotion_target(self) -> Option<Tier> {
        match self {
            Tier::Recent => Some(Tier::Medium),
            Tier::Medium => Some(Tier::Long),
            Tier::Long => Some(Tier::Ancient),
            Tier::Ancient => None,
        }
    }

    pub fn all() -> [Tier; 4] {
        [Tier::Recent, Tier::Medium, Tier::Long, Tier::Ancient]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Recent => "recent",
            Tier::Medium => "medium",
            Tier::Long => "long",
            Tier::Ancient => "ancient",
        }
    }
}

/// Label indicating whether the interaction this memory participated in was
/// judged successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeTag {
    Good,
    Bad,
    Neutral,
}

impl Default for OutcomeTag {
    fn default() -> Self {
        OutcomeTag::Neutral
    }
}

/// The fundamental record.
///
/// Invariants (enforced by callers, not by the type system, since they span
/// the whole store rather than a single record):
/// 1. `tier` transitions only through compaction writes.
/// 2. Dangling ids in `related_memories` are tolerated as a bounded stale-
///    link rate, not a panic.
/// 3. `validation_count` is independent of `access_count`.
/// 4. `user_id.is_none()` implies `is_collective == true`; the converse
///    need not hold.
/// 5. `created_at` resolution is preserved verbatim in `Recent`, coarsened
///    on promotion to a later tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub content: String,
    pub embedding: Vec<f32>,
    pub tier: Tier,
    #[serde(default)]
    pub outcome_tag: OutcomeTag,
    #[serde(default = "default_trust")]
    pub trust_score: f64,
    #[serde(default)]
    pub validation_count: u64,
    #[serde(default)]
    pub importance_score: f64,
    #[serde(default)]
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    #[serde(default)]
    pub related_memories: Vec<MemoryId>,
    #[serde(default)]
    pub concept_tags: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_collective: bool,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

fn default_trust() -> f64 {
    0.5
}

impl Memory {
    /// Build a new Recent-tier memory with neutral defaults
    /// (`trust_score = 0.5`, counts at zero, `outcome_tag = neutral`).
    pub fn new(content: String, embedding: Vec<f32>, user_id: Option<String>) -> Self {
        let now = Utc::now();
        let is_collective = user_id.is_none();
        Self {
            id: MemoryId::new(),
            content,
            embedding,
            tier: Tier::Recent,
            outcome_tag: OutcomeTag::Neutral,
            trust_score: default_trust(),
            validation_count: 0,
            importance_score: 0.0,
            access_count: 0,
            created_at: now,
            last_accessed_at: now,
            related_memories: Vec::new(),
            concept_tags: Vec::new(),
            user_id,
            is_collective,
            metadata: HashMap::new(),
        }
    }

    /// Clamp `related_memories` to `max_links`, keeping the front of the
    /// list (callers push newest-first / evict weakest explicitly).
    pub fn clamp_links(&mut self, max_links: usize) {
        if self.related_memories.len() > max_links {
            self.related_memories.truncate(max_links);
        }
    }
}
