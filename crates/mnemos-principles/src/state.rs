//! The slot vector: fixed-length, one `Principle` per occupied slot,
//! backed by [`RelationalStore`].

use mnemos_core::config::PrinciplesConfig;
use mnemos_core::errors::StorageError;
use mnemos_core::models::Principle;
use mnemos_core::traits::RelationalStore;

/// Loads the ordered slot vector, slot 1..=N, `None` for an unoccupied
/// slot. Out-of-range rows (a config shrunk after principles were already
/// mined into higher slots) are dropped rather than panicking.
pub async fn load_slots(
    store: &dyn RelationalStore,
    config: &PrinciplesConfig,
) -> Result<Vec<Option<Principle>>, StorageError> {
    let total = config.total_slots();
    let mut slots: Vec<Option<Principle>> = vec![None; total as usize];
    for principle in store.load_principles().await? {
        if principle.slot >= 1 && principle.slot <= total {
            slots[(principle.slot - 1) as usize] = Some(principle);
        }
    }
    Ok(slots)
}
