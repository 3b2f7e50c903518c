//! Background tagging: asks an LLM to judge each untagged memory's
//! outcome, confidence, and concept tags, parses its S-expression reply
//! through a defect-tolerant cleaner, and writes accepted judgments back.

mod sexpr;
mod tagger;

pub use sexpr::{clean, parse_clauses, Atom, Clause, SexprError};
pub use tagger::{interpret_reply, TagBatchSummary, Tagger, TaggerReply};
