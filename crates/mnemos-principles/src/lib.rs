//! The principles engine: the slot vector holding behavioural rules that
//! shape the personality layer's system prompt, mined from well-outcomed
//! memories on its own schedule.

mod evolve;
mod format;
mod outcomes;
mod state;

pub use evolve::{EvolveSummary, PrinciplesEngine};
pub use format::format_as_system_prompt;
pub use outcomes::{record_outcome, record_outcome_checked, Outcome};
pub use state::load_slots;
