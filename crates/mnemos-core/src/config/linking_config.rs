//! Associative graph parameters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    pub similarity_threshold: f64,
    pub max_links_per_memory: usize,
    pub link_decay_rate: f64,
    /// Minutes between two increments of the same pair's co-occurrence counter.
    pub co_occurrence_throttle_minutes: i64,
    /// Counter value a pair must cross before a link is materialized.
    pub co_occurrence_link_threshold: u32,
    /// Counter floor below which a decayed link is dropped.
    pub link_decay_floor: f64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            max_links_per_memory: 10,
            link_decay_rate: 0.95,
            co_occurrence_throttle_minutes: 30,
            co_occurrence_link_threshold: 3,
            link_decay_floor: 0.1,
        }
    }
}
