//! Storage limits and tier allocation.

use serde::{Deserialize, Serialize};

/// Fraction of the total budget allocated to each tier.
///
/// The four fractions sum to 1.0 exactly
/// (`0.325 + 0.275 + 0.225 + 0.175 == 1.0`); see DESIGN.md for the
/// rationale behind this particular split.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TierAllocation {
    pub recent: f64,
    pub medium: f64,
    pub long: f64,
    pub ancient: f64,
}

impl Default for TierAllocation {
    fn default() -> Self {
        Self {
            recent: 0.325,
            medium: 0.275,
            long: 0.225,
            ancient: 0.175,
        }
    }
}

impl TierAllocation {
    pub fn sum(&self) -> f64 {
        self.recent + self.medium + self.long + self.ancient
    }
}

/// Weights in the compaction victim score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionWeights {
    pub age: f64,
    pub importance: f64,
    pub access: f64,
}

impl Default for CompressionWeights {
    fn default() -> Self {
        Self {
            age: 0.5,
            importance: 0.3,
            access: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub max_total_memories: u64,
    pub tier_allocation: TierAllocation,
    pub compression_trigger: f64,
    pub allow_tier_overflow: bool,
    pub compression_weights: CompressionWeights,
    /// Fraction of budget to shrink a tier back to once compaction fires.
    pub compression_target: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_total_memories: 100_000,
            tier_allocation: TierAllocation::default(),
            compression_trigger: 0.90,
            allow_tier_overflow: false,
            compression_weights: CompressionWeights::default(),
            compression_target: 0.80,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        const EPSILON: f64 = 1e-6;
        if (self.tier_allocation.sum() - 1.0).abs() > EPSILON {
            return Err(format!(
                "tier allocations must sum to 1 (±{EPSILON}), got {}",
                self.tier_allocation.sum()
            ));
        }
        if self.max_total_memories == 0 {
            return Err("max_total_memories must be positive".to_string());
        }
        Ok(())
    }

    /// Budget (in record count) for a given tier.
    pub fn tier_budget(&self, fraction: f64) -> f64 {
        fraction * self.max_total_memories as f64
    }
}
