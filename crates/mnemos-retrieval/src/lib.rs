//! The retrieval front-end: the four operations a chat handler and the
//! reflection hook actually call, composing the memory store, linker, and
//! principles engine behind one facade with per-call deadlines.

mod front_end;
mod init_principles;
mod note_outcome;
mod record_turn;
mod retrieve;
mod tasks;

pub use front_end::RetrievalFrontEnd;
pub use init_principles::initialize_default_principles;
pub use retrieve::RetrieveResult;
pub use tasks::{PrinciplesTask, TaggingTask};
