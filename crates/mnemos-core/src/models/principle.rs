use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a principle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipleSource {
    Admin,
    Mined,
}

/// A behavioural rule rendered into the system prompt, one per slot.
///
/// Invariant: exactly one `Principle` exists per occupied slot; admin slots
/// (`slot <= admin_slots`) can never be overwritten by the principles
/// engine; slot order is render order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principle {
    pub slot: u32,
    pub text: String,
    pub rating: f64,
    pub source: PrincipleSource,
    pub created_at: DateTime<Utc>,
    pub last_promoted_at: DateTime<Utc>,
    #[serde(default)]
    pub validation_count: u64,
    #[serde(default)]
    pub violation_count: u64,
}

impl Principle {
    pub fn new_admin(slot: u32, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            slot,
            text: text.into(),
            rating: 1.0,
            source: PrincipleSource::Admin,
            created_at: now,
            last_promoted_at: now,
            validation_count: 0,
            violation_count: 0,
        }
    }

    pub fn new_mined(slot: u32, text: impl Into<String>, rating: f64) -> Self {
        let now = Utc::now();
        Self {
            slot,
            text: text.into(),
            rating,
            source: PrincipleSource::Mined,
            created_at: now,
            last_promoted_at: now,
            validation_count: 0,
            violation_count: 0,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.source, PrincipleSource::Admin)
    }
}
