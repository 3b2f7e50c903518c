//! `InitializeDefaultPrinciples(store)`: seeds the admin slots on first
//! start. Idempotent — an already-occupied admin slot is left untouched,
//! so calling this on every process start is safe.

use mnemos_core::errors::MnemosError;
use mnemos_core::models::Principle;
use mnemos_core::traits::RelationalStore;

/// The out-of-the-box admin principles, occupying slots `1..=DEFAULTS.len()`.
/// Operators are expected to edit or replace these through the admin
/// slots directly; the engine never overwrites them.
const DEFAULTS: &[&str] = &[
    "Be honest about uncertainty rather than inventing an answer.",
    "Respect the user's stated preferences over your own assumptions.",
    "Protect the privacy of information shared in confidence.",
];

/// Writes a default principle into every admin slot that is currently
/// unoccupied, up to `admin_slots` or `DEFAULTS.len()`, whichever is
/// smaller. Returns the number of slots it actually seeded.
pub async fn initialize_default_principles(store: &dyn RelationalStore, admin_slots: u32) -> Result<usize, MnemosError> {
    let existing = store.load_principles().await?;
    let occupied: std::collections::HashSet<u32> = existing.iter().map(|p| p.slot).collect();

    let mut seeded = 0;
    for (i, text) in DEFAULTS.iter().enumerate() {
        let slot = i as u32 + 1;
        if slot > admin_slots {
            break;
        }
        if occupied.contains(&slot) {
            continue;
        }
        store.put_principle(Principle::new_admin(slot, *text)).await?;
        seeded += 1;
    }
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mnemos_core::errors::StorageError;
    use std::sync::Mutex;

    struct FakeRelationalStore {
        principles: Mutex<Vec<Principle>>,
    }

    #[async_trait]
    impl RelationalStore for FakeRelationalStore {
        async fn load_principles(&self) -> Result<Vec<Principle>, StorageError> {
            Ok(self.principles.lock().unwrap().clone())
        }
        async fn put_principle(&self, principle: Principle) -> Result<(), StorageError> {
            let mut principles = self.principles.lock().unwrap();
            principles.retain(|p| p.slot != principle.slot);
            principles.push(principle);
            Ok(())
        }
        async fn clear_slot(&self, slot: u32) -> Result<(), StorageError> {
            self.principles.lock().unwrap().retain(|p| p.slot != slot);
            Ok(())
        }
    }

    #[tokio::test]
    async fn seeds_all_empty_admin_slots() {
        let store = FakeRelationalStore {
            principles: Mutex::new(Vec::new()),
        };
        let seeded = initialize_default_principles(&store, 3).await.unwrap();
        assert_eq!(seeded, 3);
        assert_eq!(store.principles.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn existing_admin_slot_is_left_untouched() {
        let store = FakeRelationalStore {
            principles: Mutex::new(vec![Principle::new_admin(1, "custom rule")]),
        };
        initialize_default_principles(&store, 3).await.unwrap();
        let principles = store.principles.lock().unwrap();
        let slot_one = principles.iter().find(|p| p.slot == 1).unwrap();
        assert_eq!(slot_one.text, "custom rule");
        assert_eq!(principles.len(), 3);
    }

    #[tokio::test]
    async fn never_seeds_past_admin_slots() {
        let store = FakeRelationalStore {
            principles: Mutex::new(Vec::new()),
        };
        let seeded = initialize_default_principles(&store, 1).await.unwrap();
        assert_eq!(seeded, 1);
        assert_eq!(store.principles.lock().unwrap().len(), 1);
    }
}
