use async_trait::async_trait;

use crate::errors::StorageError;
use crate::models::Principle;

/// Narrow DAO over the relational store holding `Principle` records.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn load_principles(&self) -> Result<Vec<Principle>, StorageError>;

    /// Upserts a principle at its slot. Callers are responsible for
    /// rejecting writes to admin slots before calling this.
    async fn put_principle(&self, principle: Principle) -> Result<(), StorageError>;

    async fn clear_slot(&self, slot: u32) -> Result<(), StorageError>;
}
