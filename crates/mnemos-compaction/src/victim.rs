//! Victim selection: the compression-score formula and the sort that
//! picks which records in an over-budget tier get clustered away.

use chrono::{DateTime, Utc};
use mnemos_core::config::storage_config::CompressionWeights;
use mnemos_core::models::Memory;

/// Age scaled to [0,1] over a tier's oldest/newest bounds at selection
/// time, with the oldest record at 1.0 and the newest at 0.0. A tier with
/// a single distinct `created_at` collapses to 0.5.
pub fn normalized_age(created_at: DateTime<Utc>, oldest: DateTime<Utc>, newest: DateTime<Utc>) -> f64 {
    let span = (newest - oldest).num_seconds() as f64;
    if span <= 0.0 {
        return 0.5;
    }
    let age = (newest - created_at).num_seconds() as f64;
    (age / span).clamp(0.0, 1.0)
}

/// `w_age · normAge + w_imp · (1 − importance) + w_acc · 1/(1 + log(1 + access_count))`.
/// Higher score means more compressible: old, unimportant, rarely accessed.
pub fn compression_score(weights: CompressionWeights, norm_age: f64, importance: f64, access_count: u64) -> f64 {
    let access_term = 1.0 / (1.0 + ((1 + access_count) as f64).ln());
    weights.age * norm_age + weights.importance * (1.0 - importance) + weights.access * access_term
}

/// Sorts `candidates` by compression score descending and takes the top
/// `deficit` as victims. `normAge` is computed once over the whole slice's
/// oldest/newest bounds, as the spec requires.
pub fn select_victims(candidates: Vec<Memory>, weights: CompressionWeights, deficit: u64) -> Vec<Memory> {
    if candidates.is_empty() || deficit == 0 {
        return Vec::new();
    }

    let oldest = candidates.iter().map(|m| m.created_at).min().unwrap();
    let newest = candidates.iter().map(|m| m.created_at).max().unwrap();

    let mut scored: Vec<(f64, Memory)> = candidates
        .into_iter()
        .map(|m| {
            let norm_age = normalized_age(m.created_at, oldest, newest);
            let score = compression_score(weights, norm_age, m.importance_score, m.access_count);
            (score, m)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.id.cmp(&b.1.id))
    });
    scored.truncate(deficit as usize);
    scored.into_iter().map(|(_, m)| m).collect()
}
