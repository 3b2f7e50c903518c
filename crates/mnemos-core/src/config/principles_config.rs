//! Compaction schedule and principles engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRules {
    pub recent_to_medium_days: u64,
    pub medium_to_long_days: u64,
    pub long_to_ancient_days: u64,
}

impl Default for TierRules {
    fn default() -> Self {
        Self {
            recent_to_medium_days: 7,
            medium_to_long_days: 30,
            long_to_ancient_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    pub schedule_hours: u64,
    pub tier_rules: TierRules,
    pub merge_window_recent_days: u64,
    pub merge_window_medium_days: u64,
    pub merge_window_long_days: u64,
    pub similarity_threshold: f64,
    pub max_cluster_size: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            schedule_hours: 6,
            tier_rules: TierRules::default(),
            merge_window_recent_days: 3,
            merge_window_medium_days: 14,
            merge_window_long_days: 90,
            similarity_threshold: 0.70,
            max_cluster_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinciplesConfig {
    pub admin_slots: u32,
    pub ai_managed_slots: u32,
    pub evolution_schedule_hours: u64,
    pub min_rating_threshold: f64,
    pub extraction_limit: usize,
}

impl Default for PrinciplesConfig {
    fn default() -> Self {
        Self {
            admin_slots: 3,
            ai_managed_slots: 7,
            evolution_schedule_hours: 24,
            min_rating_threshold: 0.5,
            extraction_limit: 200,
        }
    }
}

impl PrinciplesConfig {
    pub fn total_slots(&self) -> u32 {
        self.admin_slots + self.ai_managed_slots
    }
}
