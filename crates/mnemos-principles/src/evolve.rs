//! `Evolve()`: mines candidate rules from well-outcomed memories, merges
//! them with re-scored existing slots, and persists the winners.

use std::cmp::Ordering;

use mnemos_core::config::PrinciplesConfig;
use mnemos_core::errors::{MnemosError, PrinciplesError};
use mnemos_core::models::{Memory, Principle};
use mnemos_core::scoring::cosine_similarity;
use mnemos_core::traits::{ChatMessage, ChatRequest, Embedder, LlmClient, MemoryStore, RelationalStore};
use mnemos_tagger::{clean, parse_clauses, Atom, Clause};
use tracing::warn;

use crate::state::load_slots;

/// How many good-tagged memories are sent to the LLM per mining call.
const MINING_BATCH_SIZE: usize = 20;

/// Cosine similarity above which two candidate rules are treated as the
/// same rule and collapsed to the higher-rated of the pair.
const NEAR_DUPLICATE_THRESHOLD: f64 = 0.92;

/// A candidate rule awaiting slot assignment, either freshly mined or a
/// re-scored existing principle.
#[derive(Debug, Clone)]
struct Candidate {
    text: String,
    rating: f64,
    /// Carries over an existing principle's counters and Mined provenance
    /// when this candidate is a re-score rather than a fresh mine.
    carry_over: Option<Principle>,
}

impl Candidate {
    fn into_principle(self, slot: u32) -> Principle {
        match self.carry_over {
            Some(mut existing) => {
                existing.slot = slot;
                existing.rating = self.rating;
                existing
            }
            None => Principle::new_mined(slot, self.text, self.rating),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvolveSummary {
    pub candidates_mined: usize,
    pub candidates_assigned: usize,
}

pub struct PrinciplesEngine {
    config: PrinciplesConfig,
}

impl PrinciplesEngine {
    pub fn new(config: PrinciplesConfig) -> Self {
        Self { config }
    }

    /// Runs one full evolution pass. Every write happens only after every
    /// mining/re-scoring step has succeeded, so a failure at any earlier
    /// step leaves the previous slot state untouched — the best-effort
    /// guarantee the schedule relies on.
    pub async fn evolve(
        &self,
        memory_store: &dyn MemoryStore,
        relational: &dyn RelationalStore,
        embedder: &dyn Embedder,
        llm: &dyn LlmClient,
    ) -> Result<EvolveSummary, MnemosError> {
        let extracted = memory_store.find_good_by_priority(self.config.extraction_limit).await?;
        if extracted.is_empty() {
            return Ok(EvolveSummary::default());
        }

        let mut mined = mine_candidates(llm, &extracted).await?;
        collapse_near_duplicates(&mut mined, embedder).await?;
        mined.retain(|c| c.rating >= self.config.min_rating_threshold);
        let candidates_mined = mined.len();

        let slots = load_slots(relational, &self.config).await?;
        let occupied_ai_slots: Vec<&Principle> = slots
            .iter()
            .skip(self.config.admin_slots as usize)
            .filter_map(|s| s.as_ref())
            .collect();
        let rescored = rescore_occupied(llm, &occupied_ai_slots).await?;

        let mut pool = rescored;
        pool.extend(mined);
        pool.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));

        let ai_slot_count = self.config.ai_managed_slots as usize;
        let assigned: Vec<Candidate> = pool.into_iter().take(ai_slot_count).collect();
        let candidates_assigned = assigned.len();

        for (i, candidate) in assigned.into_iter().enumerate() {
            let slot = self.config.admin_slots + 1 + i as u32;
            relational.put_principle(candidate.into_principle(slot)).await?;
        }
        for i in candidates_assigned..ai_slot_count {
            let slot = self.config.admin_slots + 1 + i as u32;
            relational.clear_slot(slot).await?;
        }

        Ok(EvolveSummary {
            candidates_mined,
            candidates_assigned,
        })
    }
}

fn build_mining_request(batch: &[&Memory]) -> ChatRequest {
    let system = ChatMessage::system(
        "The following memories all describe outcomes tagged good. Propose imperative \
         behavioural rules a rational agent should follow to reproduce these outcomes, each \
         rated in [0,1] for how strongly the evidence supports it. Reply only with clauses of \
         the form (rule \"text\" rating), one per proposed rule.",
    );
    let body = batch.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n\n");
    ChatRequest::new(vec![system, ChatMessage::user(body)])
}

async fn mine_candidates(llm: &dyn LlmClient, memories: &[Memory]) -> Result<Vec<Candidate>, MnemosError> {
    let mut candidates = Vec::new();
    for batch in memories.chunks(MINING_BATCH_SIZE) {
        let refs: Vec<&Memory> = batch.iter().collect();
        let raw = llm.chat(build_mining_request(&refs)).await?;
        match parse_rule_clauses(&raw) {
            Ok(batch_candidates) => candidates.extend(batch_candidates),
            Err(err) => warn!(error = %err, "mining batch reply rejected"),
        }
    }
    Ok(candidates)
}

fn parse_rule_clauses(raw: &str) -> Result<Vec<Candidate>, PrinciplesError> {
    let cleaned = clean(raw);
    let clauses = parse_clauses(&cleaned).map_err(|e| PrinciplesError::EvolutionFailed(e.to_string()))?;

    let mut candidates = Vec::new();
    for clause in clauses.iter().filter(|c| c.tag.eq_ignore_ascii_case("rule")) {
        if let Some(candidate) = candidate_from_clause(clause) {
            candidates.push(candidate);
        }
    }
    Ok(candidates)
}

fn candidate_from_clause(clause: &Clause) -> Option<Candidate> {
    let text = clause.args.iter().find_map(|a| match a {
        Atom::Str(s) => Some(s.clone()),
        _ => None,
    })?;
    let rating = clause.args.iter().find_map(|a| match a {
        Atom::Number(n) => Some(*n),
        _ => None,
    })?;
    if !(0.0..=1.0).contains(&rating) {
        return None;
    }
    Some(Candidate {
        text,
        rating,
        carry_over: None,
    })
}

/// Collapses candidates whose embeddings are near-duplicates, keeping the
/// higher-rated one. O(n^2) over the mined batch, which is small relative
/// to `extraction_limit`.
async fn collapse_near_duplicates(candidates: &mut Vec<Candidate>, embedder: &dyn Embedder) -> Result<(), MnemosError> {
    let mut embeddings = Vec::with_capacity(candidates.len());
    for c in candidates.iter() {
        embeddings.push(embedder.embed(&c.text).await?);
    }

    let mut keep = vec![true; candidates.len()];
    for i in 0..candidates.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if !keep[j] {
                continue;
            }
            if cosine_similarity(&embeddings[i], &embeddings[j]) >= NEAR_DUPLICATE_THRESHOLD {
                if candidates[j].rating > candidates[i].rating {
                    keep[i] = false;
                    break;
                }
                keep[j] = false;
            }
        }
    }

    let mut kept = Vec::with_capacity(candidates.len());
    for (candidate, keep) in candidates.drain(..).zip(keep) {
        if keep {
            kept.push(candidate);
        }
    }
    *candidates = kept;
    Ok(())
}

fn build_rescore_request(slots: &[&Principle]) -> ChatRequest {
    let system = ChatMessage::system(
        "Re-rate each existing guideline below in [0,1], weighing both its wording and its \
         validation/violation history. Reply only with clauses of the form (score slot rating), \
         one per guideline, using the given slot number.",
    );
    let body = slots
        .iter()
        .map(|p| {
            format!(
                "slot {}: \"{}\" (validated {} times, violated {} times)",
                p.slot, p.text, p.validation_count, p.violation_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    ChatRequest::new(vec![system, ChatMessage::user(body)])
}

async fn rescore_occupied(llm: &dyn LlmClient, slots: &[&Principle]) -> Result<Vec<Candidate>, MnemosError> {
    if slots.is_empty() {
        return Ok(Vec::new());
    }

    let raw = llm.chat(build_rescore_request(slots)).await?;
    let cleaned = clean(&raw);
    let clauses = parse_clauses(&cleaned).map_err(|e| PrinciplesError::EvolutionFailed(e.to_string()))?;

    let mut rescored = Vec::new();
    for clause in clauses.iter().filter(|c| c.tag.eq_ignore_ascii_case("score")) {
        let Some((slot, rating)) = score_from_clause(clause) else {
            continue;
        };
        if let Some(principle) = slots.iter().find(|p| p.slot == slot) {
            rescored.push(Candidate {
                text: principle.text.clone(),
                rating,
                carry_over: Some((*principle).clone()),
            });
        }
    }
    Ok(rescored)
}

fn score_from_clause(clause: &Clause) -> Option<(u32, f64)> {
    let mut numbers = clause.args.iter().filter_map(|a| match a {
        Atom::Number(n) => Some(*n),
        _ => None,
    });
    let slot = numbers.next()? as u32;
    let rating = numbers.next()?;
    if !(0.0..=1.0).contains(&rating) {
        return None;
    }
    Some((slot, rating))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_mining_reply() {
        let raw = r#"(rule "always cite sources" 0.9) (rule "ask clarifying questions" 0.7)"#;
        let candidates = parse_rule_clauses(raw).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "always cite sources");
        assert_eq!(candidates[0].rating, 0.9);
    }

    #[test]
    fn out_of_range_rating_is_dropped() {
        let raw = r#"(rule "bad rating" 1.5) (rule "good rating" 0.5)"#;
        let candidates = parse_rule_clauses(raw).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "good rating");
    }

    #[tokio::test]
    async fn near_duplicates_collapse_to_higher_rated() {
        struct IdentityEmbedder;
        #[async_trait::async_trait]
        impl Embedder for IdentityEmbedder {
            async fn embed(&self, text: &str) -> Result<Vec<f32>, mnemos_core::errors::EmbeddingError> {
                // Two texts sharing a prefix produce near-identical vectors;
                // otherwise nearly orthogonal.
                let base = if text.starts_with("cite") { 1.0 } else { 0.0 };
                Ok(vec![base, 1.0 - base])
            }
            fn dimensions(&self) -> usize {
                2
            }
        }

        let mut candidates = vec![
            Candidate {
                text: "cite sources always".to_string(),
                rating: 0.6,
                carry_over: None,
            },
            Candidate {
                text: "cite the source material".to_string(),
                rating: 0.9,
                carry_over: None,
            },
            Candidate {
                text: "ask before assuming".to_string(),
                rating: 0.5,
                carry_over: None,
            },
        ];

        collapse_near_duplicates(&mut candidates, &IdentityEmbedder).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().any(|c| c.rating == 0.9));
        assert!(candidates.iter().any(|c| c.text == "ask before assuming"));
    }

    #[test]
    fn score_clause_parses_slot_and_rating() {
        let raw = "(score 4 0.6) (score 5 0.2)";
        let clauses = parse_clauses(raw).unwrap();
        let parsed: Vec<_> = clauses.iter().filter_map(score_from_clause).collect();
        assert_eq!(parsed, vec![(4, 0.6), (5, 0.2)]);
    }
}
