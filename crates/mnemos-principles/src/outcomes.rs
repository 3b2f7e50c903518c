//! `RecordOutcome`: bumps a slot's validation/violation counters, wired
//! from the reflection hook (see spec §6).

use mnemos_core::errors::{PrinciplesError, StorageError};
use mnemos_core::models::Principle;
use mnemos_core::traits::RelationalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Validated,
    Violated,
}

/// Increments `validation_count` or `violation_count` on the principle
/// occupying `slot`. A no-op if the slot is currently empty — there is no
/// principle to credit or fault.
pub async fn record_outcome(store: &dyn RelationalStore, slot: u32, outcome: Outcome) -> Result<(), StorageError> {
    let Some(mut principle) = find_slot(store, slot).await? else {
        return Ok(());
    };
    match outcome {
        Outcome::Validated => principle.validation_count += 1,
        Outcome::Violated => principle.violation_count += 1,
    }
    store.put_principle(principle).await
}

/// As [`record_outcome`], but rejects writes targeting an admin slot —
/// reflection only ever grades mined principles.
pub async fn record_outcome_checked(
    store: &dyn RelationalStore,
    slot: u32,
    outcome: Outcome,
    admin_slots: u32,
) -> Result<(), PrinciplesError> {
    if slot <= admin_slots {
        return Err(PrinciplesError::AdminSlotLocked { slot });
    }
    record_outcome(store, slot, outcome)
        .await
        .map_err(|e| PrinciplesError::EvolutionFailed(e.to_string()))
}

async fn find_slot(store: &dyn RelationalStore, slot: u32) -> Result<Option<Principle>, StorageError> {
    Ok(store.load_principles().await?.into_iter().find(|p| p.slot == slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mnemos_core::models::DialogueGoal;
    use mnemos_core::traits::DialogueGoalStore;
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

    #[async_trait]
    impl DialogueGoalStore for FakeRelationalStore {
        async fn put_goal(&self, _goal: DialogueGoal) -> Result<(), StorageError> {
            Ok(())
        }
        async fn get_goal(&self, _id: &str) -> Result<Option<DialogueGoal>, StorageError> {
            Ok(None)
        }
        async fn list_goals(&self) -> Result<Vec<DialogueGoal>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn validated_increments_validation_count() {
        let store = FakeRelationalStore {
            principles: Mutex::new(vec![Principle::new_mined(2, "cite sources", 0.7)]),
        };
        record_outcome(&store, 2, Outcome::Validated).await.unwrap();
        let principles = store.principles.lock().unwrap();
        assert_eq!(principles[0].validation_count, 1);
        assert_eq!(principles[0].violation_count, 0);
    }

    #[tokio::test]
    async fn missing_slot_is_a_no_op() {
        let store = FakeRelationalStore {
            principles: Mutex::new(Vec::new()),
        };
        record_outcome(&store, 5, Outcome::Violated).await.unwrap();
        assert!(store.principles.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checked_write_rejects_admin_slot() {
        let store = FakeRelationalStore {
            principles: Mutex::new(vec![Principle::new_admin(1, "be honest")]),
        };
        let err = record_outcome_checked(&store, 1, Outcome::Validated, 3).await.unwrap_err();
        assert!(matches!(err, PrinciplesError::AdminSlotLocked { slot: 1 }));
    }
}
