/// Principles engine errors.
#[derive(Debug, thiserror::Error)]
pub enum PrinciplesError {
    #[error("admin slot {slot} cannot be overwritten")]
    AdminSlotLocked { slot: u32 },

    #[error("invalid slot index: {slot} (max {max})")]
    InvalidSlot { slot: u32, max: u32 },

    #[error("evolution run failed: {0}")]
    EvolutionFailed(String),
}
