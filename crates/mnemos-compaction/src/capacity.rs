//! Per-tier budget accounting: when a tier is over its trigger line, how
//! many records it needs to shed to reach its target, after accounting for
//! overflow borrowing from tiers with headroom to spare.

use std::collections::HashMap;

use mnemos_core::config::StorageConfig;
use mnemos_core::models::Tier;

fn allocation_fraction(config: &StorageConfig, tier: Tier) -> f64 {
    let alloc = &config.tier_allocation;
    match tier {
        Tier::Recent => alloc.recent,
        Tier::Medium => alloc.medium,
        Tier::Long => alloc.long,
        Tier::Ancient => alloc.ancient,
    }
}

/// Record-count budget for `tier` (`allocation[T] · MaxTotal`).
pub fn tier_budget(config: &StorageConfig, tier: Tier) -> f64 {
    config.tier_budget(allocation_fraction(config, tier))
}

/// `count(T) ≥ compressionTrigger · allocation[T] · MaxTotal`.
pub fn is_over_trigger(config: &StorageConfig, tier: Tier, count: u64) -> bool {
    count as f64 >= tier_budget(config, tier) * config.compression_trigger
}

/// Unused headroom below a tier's own trigger line — the amount it could
/// still absorb before it would itself need compacting.
fn headroom(config: &StorageConfig, tier: Tier, count: u64) -> f64 {
    let trigger_line = tier_budget(config, tier) * config.compression_trigger;
    (trigger_line - count as f64).max(0.0)
}

/// Records tier `T` must shed to reach `compression_target · allocation[T] ·
/// MaxTotal`, after borrowing spare headroom from other tiers when
/// `allow_tier_overflow` is set. Zero if `T` isn't over its trigger line.
pub fn deficit(config: &StorageConfig, counts: &HashMap<Tier, u64>, tier: Tier) -> u64 {
    let count = *counts.get(&tier).unwrap_or(&0);
    if !is_over_trigger(config, tier, count) {
        return 0;
    }

    let target = tier_budget(config, tier) * config.compression_target;
    let mut over = count as f64 - target;

    if config.allow_tier_overflow {
        let borrowed: f64 = Tier::all()
            .into_iter()
            .filter(|&t| t != tier)
            .map(|t| headroom(config, t, *counts.get(&t).unwrap_or(&0)))
            .sum();
        over = (over - borrowed).max(0.0);
    }

    over.ceil().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(recent: u64, medium: u64, long: u64, ancient: u64) -> HashMap<Tier, u64> {
        HashMap::from([
            (Tier::Recent, recent),
            (Tier::Medium, medium),
            (Tier::Long, long),
            (Tier::Ancient, ancient),
        ])
    }

    #[test]
    fn under_trigger_has_no_deficit() {
        let config = StorageConfig::default();
        let counts = counts(100, 0, 0, 0);
        assert_eq!(deficit(&config, &counts, Tier::Recent), 0);
    }

    #[test]
    fn over_trigger_targets_compression_target_fraction() {
        let config = StorageConfig::default();
        let budget = tier_budget(&config, Tier::Recent);
        let over_count = (budget * config.compression_trigger) as u64 + 10;
        let counts = counts(over_count, 0, 0, 0);

        let expected_target = budget * config.compression_target;
        let expected = (over_count as f64 - expected_target).ceil() as u64;
        assert_eq!(deficit(&config, &counts, Tier::Recent), expected);
    }

    #[test]
    fn overflow_borrowing_shrinks_deficit_when_other_tiers_have_headroom() {
        let mut config = StorageConfig::default();
        config.allow_tier_overflow = true;
        let budget = tier_budget(&config, Tier::Recent);
        let over_count = (budget * config.compression_trigger) as u64 + 10;

        let without_borrow = counts(over_count, 0, 0, 0);
        let with_borrow = counts(over_count, 0, 0, 0);

        let mut no_overflow_config = config.clone();
        no_overflow_config.allow_tier_overflow = false;

        let baseline = deficit(&no_overflow_config, &without_borrow, Tier::Recent);
        let borrowed = deficit(&config, &with_borrow, Tier::Recent);
        assert!(borrowed <= baseline);
    }
}
