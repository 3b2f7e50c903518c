//! # mnemos-core
//!
//! Shared types, configuration, error taxonomy, trait boundaries, and the
//! unified scoring function used across the Mnemos memory engine.

pub mod config;
pub mod errors;
pub mod models;
pub mod scoring;
pub mod traits;

pub use config::MnemosConfig;
pub use errors::{MnemosError, MnemosResult};
pub use models::{DialogueGoal, Memory, MemoryId, OutcomeTag, Principle, PrincipleSource, Tier};
