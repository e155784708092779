//! Fallback / Escalation Policy: decides how far a question gets.
//!
//! Tier 0 answers "nothing found", tier 1 "not confident enough", tier 2
//! gathers grounding context and tier 3 synthesizes the reply, falling back
//! to the best stored answer when the completion service is unreachable.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use qadb_core::config::PolicyConfig;
use qadb_core::error::Error;
use qadb_core::types::{ContextBundle, Metric, SearchResult};
use qadb_llm::{Completion, Generator};

use crate::engine::SearchEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Unavailable,
    SearchFailed,
    NoMatch,
    LowConfidence,
    Generated,
    DegradedToRaw,
    RawAnswer,
}

impl Outcome {
    pub fn answered(self) -> bool {
        matches!(self, Outcome::Generated | Outcome::DegradedToRaw | Outcome::RawAnswer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answered: bool,
    pub outcome: Outcome,
    pub answer: String,
    /// Grounding context, present whenever the question passed the confidence gate.
    pub metadata: Option<ContextBundle>,
    pub results: Vec<SearchResult>,
}

impl Answer {
    fn unanswered(outcome: Outcome, message: &str, results: Vec<SearchResult>) -> Self {
        Self { answered: false, outcome, answer: message.to_string(), metadata: None, results }
    }
}

pub struct FallbackPolicy {
    engine: Arc<SearchEngine>,
    generator: Option<Arc<Generator>>,
    config: PolicyConfig,
}

impl FallbackPolicy {
    pub fn new(engine: Arc<SearchEngine>, generator: Option<Arc<Generator>>, config: PolicyConfig) -> Self {
        Self { engine, generator, config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub async fn answer(&self, question: &str, k: usize) -> Answer {
        let messages = &self.config.messages;
        let results = match self.run_search(question, k).await {
            Ok(results) => results,
            Err(Error::Unavailable(reason)) => {
                warn!(%reason, "question received while index is unavailable");
                return Answer::unanswered(Outcome::Unavailable, &messages.unavailable, Vec::new());
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                return Answer::unanswered(Outcome::SearchFailed, &messages.search_error, Vec::new());
            }
        };

        let metric = self.engine.metric();
        let Some(best) = results.first() else {
            info!("no match");
            return Answer::unanswered(Outcome::NoMatch, &messages.no_match, results);
        };
        if !metric.passes(best.score, self.config.accept_threshold) {
            info!(score = best.score, threshold = self.config.accept_threshold, "low confidence");
            return Answer::unanswered(Outcome::LowConfidence, &messages.low_confidence, results);
        }

        let bundle = self.build_context(question, &results, metric);
        let stored = best.answer.clone();
        let (outcome, text) = match (&self.generator, self.config.generate) {
            (Some(generator), true) => {
                let context = Some(bundle.combined_context.as_str()).filter(|c| !c.is_empty());
                match generator.generate(question, context).await {
                    Completion::Generated(text) => (Outcome::Generated, text),
                    Completion::TransportFailure { reason, .. } => {
                        warn!(%reason, "completion unavailable, returning stored answer");
                        (Outcome::DegradedToRaw, stored)
                    }
                }
            }
            _ => (Outcome::RawAnswer, stored),
        };

        let mut text = self.with_confidence(text, bundle.top_score, metric);
        text = truncate_chars(&text, self.config.max_answer_chars);
        info!(?outcome, score = bundle.top_score, contexts = bundle.contexts.len(), "answered");
        Answer { answered: true, outcome, answer: text, metadata: Some(bundle), results }
    }

    async fn run_search(&self, question: &str, k: usize) -> qadb_core::Result<Vec<SearchResult>> {
        let engine = Arc::clone(&self.engine);
        let question = question.to_string();
        tokio::task::spawn_blocking(move || engine.try_search(&question, k))
            .await
            .map_err(|e| Error::Operation(format!("search task failed: {e}")))?
    }

    /// Collect results that clear the context threshold, in rank order.
    pub fn build_context(&self, question: &str, results: &[SearchResult], metric: Metric) -> ContextBundle {
        let contexts: Vec<String> = results
            .iter()
            .filter(|r| metric.passes(r.score, self.config.context_threshold))
            .map(SearchResult::context_line)
            .collect();
        debug!(contexts = contexts.len(), "context assembled");
        ContextBundle {
            question: question.to_string(),
            combined_context: contexts.join("\n\n"),
            contexts,
            top_score: results.first().map(|r| r.score).unwrap_or_else(|| metric.worst()),
        }
    }

    fn with_confidence(&self, text: String, score: f32, metric: Metric) -> String {
        if self.config.show_confidence && metric == Metric::InnerProduct {
            format!("{text}{}", confidence_suffix(score))
        } else {
            text
        }
    }
}

pub fn confidence_suffix(score: f32) -> String {
    format!(" (ความมั่นใจ: {:.0}%)", score * 100.0)
}

/// Cut `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("สวัสดีครับ", 20), "สวัสดีครับ");
        assert_eq!(truncate_chars("สวัสดีครับ", 6), "สวั...");
        assert_eq!(truncate_chars("abcdef", 6), "abcdef");
    }

    #[test]
    fn suffix_rounds_to_whole_percent() {
        assert_eq!(confidence_suffix(0.876), " (ความมั่นใจ: 88%)");
    }

    #[test]
    fn only_generated_and_raw_outcomes_count_as_answered() {
        assert!(Outcome::DegradedToRaw.answered());
        assert!(!Outcome::LowConfidence.answered());
        assert!(!Outcome::Unavailable.answered());
    }
}
