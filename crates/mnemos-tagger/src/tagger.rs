use mnemos_core::errors::{MnemosError, TaggingError};
use mnemos_core::models::{Memory, OutcomeTag};
use mnemos_core::traits::{ChatMessage, ChatRequest, Embedder, LlmClient, MemoryStore};

use crate::sexpr::{self, Atom, Clause};

/// Decoded, validated tagger reply. `rewritten_content` is set only when
/// the model includes an optional `(content "...")` clause normalizing the
/// record's wording; most replies omit it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggerReply {
    pub outcome: OutcomeTag,
    pub confidence: f64,
    pub concepts: Vec<String>,
    pub rewritten_content: Option<String>,
}

/// Summary of one `run_batch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TagBatchSummary {
    pub visited: usize,
    pub tagged: usize,
    pub rejected: usize,
}

pub struct Tagger {
    batch_size: usize,
}

impl Tagger {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Processes up to `batch_size` untagged memories: asks the LLM for an
    /// outcome/confidence/concepts judgment on each, and on content rewrite
    /// regenerates the embedding and updates links.
    pub async fn run_batch(
        &self,
        store: &dyn MemoryStore,
        llm: &dyn LlmClient,
        embedder: &dyn Embedder,
    ) -> Result<TagBatchSummary, MnemosError> {
        let candidates = store.find_untagged(self.batch_size).await?;
        let mut summary = TagBatchSummary::default();

        for memory in candidates {
            summary.visited += 1;
            match self.tag_one(store, llm, embedder, memory).await {
                Ok(()) => summary.tagged += 1,
                Err(err) => {
                    summary.rejected += 1;
                    tracing::warn!(error = %err, "tagger rejected reply");
                }
            }
        }

        Ok(summary)
    }

    async fn tag_one(
        &self,
        store: &dyn MemoryStore,
        llm: &dyn LlmClient,
        embedder: &dyn Embedder,
        memory: Memory,
    ) -> Result<(), MnemosError> {
        let request = build_request(&memory);
        let raw_reply = llm.chat(request).await?;
        let reply = interpret_reply(&raw_reply)?;

        store
            .update_tags(memory.id, reply.outcome, reply.confidence, reply.concepts)
            .await?;

        if let Some(rewritten) = reply.rewritten_content {
            let embedding = embedder.embed(&rewritten).await?;
            store.rewrite_content(memory.id, rewritten, embedding).await?;
            let related = memory.related_memories.clone();
            let max_links = related.len().max(1);
            store.update_links(memory.id, related, max_links).await?;
        }

        Ok(())
    }
}

fn build_request(memory: &Memory) -> ChatRequest {
    let system = ChatMessage::system(
        "Classify the outcome of the following memory as good, bad, or neutral; rate your \
         confidence in [0,1]; and list up to 5 short concept tags. Reply only with \
         (outcome \"good|bad|neutral\") (confidence x) (concepts \"a\" \"b\" ...). If the \
         wording is unclear, you may also include (content \"cleaned up text\") to replace it.",
    );
    let user = ChatMessage::user(memory.content.clone());
    ChatRequest::new(vec![system, user])
}

/// Runs the cleaner pass, parses the clauses, and validates the result.
pub fn interpret_reply(raw: &str) -> Result<TaggerReply, TaggingError> {
    let cleaned = sexpr::clean(raw);
    let clauses = sexpr::parse_clauses(&cleaned).map_err(|e| TaggingError::MalformedReply(e.to_string()))?;

    let outcome = find_outcome(&clauses)?;
    let confidence = find_confidence(&clauses)?;
    let concepts = find_concepts(&clauses);
    let rewritten_content = find_content(&clauses);

    Ok(TaggerReply {
        outcome,
        confidence,
        concepts,
        rewritten_content,
    })
}

fn find_clause<'a>(clauses: &'a [Clause], tag: &str) -> Option<&'a Clause> {
    clauses.iter().find(|c| c.tag.eq_ignore_ascii_case(tag))
}

fn find_outcome(clauses: &[Clause]) -> Result<OutcomeTag, TaggingError> {
    let clause = find_clause(clauses, "outcome").ok_or_else(|| TaggingError::MissingClause("outcome".to_string()))?;
    let value = clause
        .args
        .iter()
        .find_map(|a| match a {
            Atom::Str(s) | Atom::Symbol(s) => Some(s.as_str()),
            Atom::Number(_) => None,
        })
        .ok_or_else(|| TaggingError::MalformedReply("outcome clause has no value".to_string()))?;

    match value.to_ascii_lowercase().as_str() {
        "good" => Ok(OutcomeTag::Good),
        "bad" => Ok(OutcomeTag::Bad),
        "neutral" => Ok(OutcomeTag::Neutral),
        other => Err(TaggingError::MalformedReply(format!("unknown outcome '{other}'"))),
    }
}

fn find_confidence(clauses: &[Clause]) -> Result<f64, TaggingError> {
    let clause = find_clause(clauses, "confidence").ok_or(TaggingError::InvalidConfidence)?;
    let value = clause
        .args
        .iter()
        .find_map(|a| match a {
            Atom::Number(n) => Some(*n),
            _ => None,
        })
        .ok_or(TaggingError::InvalidConfidence)?;

    if !(0.0..=1.0).contains(&value) {
        return Err(TaggingError::InvalidConfidence);
    }
    Ok(value)
}

fn find_concepts(clauses: &[Clause]) -> Vec<String> {
    find_clause(clauses, "concepts")
        .map(|clause| {
            clause
                .args
                .iter()
                .filter_map(|a| match a {
                    Atom::Str(s) | Atom::Symbol(s) => Some(s.clone()),
                    Atom::Number(_) => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn find_content(clauses: &[Clause]) -> Option<String> {
    find_clause(clauses, "content").and_then(|clause| {
        clause.args.iter().find_map(|a| match a {
            Atom::Str(s) => Some(s.clone()),
            _ => None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interprets_well_formed_reply() {
        let reply = interpret_reply(r#"(outcome "good") (confidence 0.85) (concepts "rust" "cli")"#).unwrap();
        assert_eq!(reply.outcome, OutcomeTag::Good);
        assert_eq!(reply.confidence, 0.85);
        assert_eq!(reply.concepts, vec!["rust".to_string(), "cli".to_string()]);
    }

    #[test]
    fn rejects_missing_confidence() {
        let err = interpret_reply(r#"(outcome "good") (concepts "rust")"#).unwrap_err();
        assert_eq!(err, TaggingError::InvalidConfidence);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = interpret_reply(r#"(outcome "good") (confidence 1.4)"#).unwrap_err();
        assert_eq!(err, TaggingError::InvalidConfidence);
    }

    #[test]
    fn concepts_default_to_empty_when_absent() {
        let reply = interpret_reply(r#"(outcome "neutral") (confidence 0.5)"#).unwrap();
        assert!(reply.concepts.is_empty());
    }

    #[test]
    fn tolerates_malformed_fencing_and_missing_close_paren() {
        let raw = "```\n(outcome \"bad\") (confidence 0.2\n```";
        let reply = interpret_reply(raw).unwrap();
        assert_eq!(reply.outcome, OutcomeTag::Bad);
        assert_eq!(reply.confidence, 0.2);
    }

    #[test]
    fn content_clause_is_optional_and_carried_through() {
        let without = interpret_reply(r#"(outcome "good") (confidence 0.6)"#).unwrap();
        assert_eq!(without.rewritten_content, None);

        let with = interpret_reply(r#"(outcome "good") (confidence 0.6) (content "cleaned text")"#).unwrap();
        assert_eq!(with.rewritten_content, Some("cleaned text".to_string()));
    }
}
