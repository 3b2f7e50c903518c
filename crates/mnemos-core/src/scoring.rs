//! The single re-ranking scoring function shared by retrieval and
//! principles mining, so the two subsystems can't drift apart on what
//! "trustworthy" means. Kept dependency-free and unit-testable in
//! isolation.

use chrono::{DateTime, Utc};

use crate::models::OutcomeTag;

/// Implementation constants for the re-rank formula (γ, δ). Not exposed
/// in the configuration surface — only β = `good_behaviour_bias` is
/// user-configurable.
#[derive(Debug, Clone, Copy)]
pub struct RerankConstants {
    /// Weight of the trust-score boost.
    pub gamma: f64,
    /// Weight of the recency boost.
    pub delta: f64,
    /// Half-life, in days, of the recency boost's exponential decay.
    pub recency_half_life_days: f64,
}

impl Default for RerankConstants {
    fn default() -> Self {
        Self {
            gamma: 0.1,
            delta: 0.1,
            recency_half_life_days: 14.0,
        }
    }
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 for a
/// zero-magnitude vector rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// `outcomeBoost(outcome_tag, beta)`: +beta for good, 0 for neutral, -beta
/// for bad.
pub fn outcome_boost(tag: OutcomeTag, beta: f64) -> f64 {
    match tag {
        OutcomeTag::Good => beta,
        OutcomeTag::Neutral => 0.0,
        OutcomeTag::Bad => -beta,
    }
}

/// `trustBoost(trust_score, gamma)`: linear in trust, centered so a
/// neutral 0.5 trust contributes nothing.
pub fn trust_boost(trust_score: f64, gamma: f64) -> f64 {
    gamma * (trust_score - 0.5) * 2.0
}

/// `recencyBoost(last_accessed_at, delta)`: smooth exponential decay over
/// days since last access.
pub fn recency_boost(
    last_accessed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    delta: f64,
    half_life_days: f64,
) -> f64 {
    let age_days = (now - last_accessed_at).num_seconds().max(0) as f64 / 86_400.0;
    let decay = 0.5f64.powf(age_days / half_life_days.max(f64::EPSILON));
    delta * decay
}

/// The full re-rank formula:
///
/// `score = sim * (1 - beta) + outcomeBoost(tag, beta) + trustBoost(trust, gamma)
///          + recencyBoost(last_accessed_at, delta)`
///
/// `beta` is `good_behaviour_bias` in [0,1]; `constants` holds the
/// implementation-fixed gamma/delta. Monotonic in `beta` for a fixed
/// `tag`/`sim`: increasing `beta` for a `good` candidate strictly cannot
/// decrease its score relative to a `bad` candidate of equal `sim`,
/// since `outcome_boost` is `+beta` vs `-beta` while the
/// `sim * (1 - beta)` term is shared.
pub fn rerank_score(
    sim: f64,
    tag: OutcomeTag,
    trust_score: f64,
    last_accessed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    beta: f64,
    constants: RerankConstants,
) -> f64 {
    sim * (1.0 - beta)
        + outcome_boost(tag, beta)
        + trust_boost(trust_score, constants.gamma)
        + recency_boost(
            last_accessed_at,
            now,
            constants.delta,
            constants.recency_half_life_days,
        )
}

/// Ordering key for extraction (`trust_score × validation_count`,
/// descending), shared by principles mining so both subsystems agree on
/// "how much to trust a good-tagged memory."
pub fn extraction_priority(trust_score: f64, validation_count: u64) -> f64 {
    trust_score * validation_count as f64
}
