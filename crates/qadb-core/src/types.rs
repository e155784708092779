//! Domain types shared by the loader, the index and the answering policy.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A question/answer record from the document source.
///
/// - `text`: `"<question> <answer>"`, the payload that gets embedded
/// - `source`: origin tag (record `source` field, or the file stem)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub question: String,
    pub answer: String,
    pub source: Option<String>,
}

impl Document {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, source: Option<String>) -> Self {
        let question = question.into();
        let answer = answer.into();
        let text = format!("{question} {answer}");
        Self { text, question, answer, source }
    }
}

/// Similarity convention of an index.
///
/// `InnerProduct` works on L2-normalized vectors, so scores are cosine
/// similarities in `[-1, 1]` and higher is better. `L2` scores are squared
/// euclidean distances and lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    #[serde(alias = "ip", alias = "cosine")]
    InnerProduct,
    L2,
}

impl Metric {
    pub fn normalizes(self) -> bool {
        matches!(self, Metric::InnerProduct)
    }

    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        let s = match self {
            Metric::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
            Metric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>(),
        };
        if s.is_nan() { self.worst() } else { s }
    }

    /// Ordering that sorts the better score first.
    pub fn better(self, a: f32, b: f32) -> Ordering {
        match self {
            Metric::InnerProduct => b.total_cmp(&a),
            Metric::L2 => a.total_cmp(&b),
        }
    }

    /// Whether `score` is at least as good as `threshold`.
    pub fn passes(self, score: f32, threshold: f32) -> bool {
        match self {
            Metric::InnerProduct => score >= threshold,
            Metric::L2 => score <= threshold,
        }
    }

    pub fn worst(self) -> f32 {
        match self {
            Metric::InnerProduct => f32::NEG_INFINITY,
            Metric::L2 => f32::INFINITY,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::InnerProduct => f.write_str("inner_product"),
            Metric::L2 => f.write_str("l2"),
        }
    }
}

/// One ranked hit. `score` follows the index [`Metric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub question: String,
    pub answer: String,
    pub score: f32,
    pub text: String,
    pub source: Option<String>,
}

impl SearchResult {
    pub fn from_document(doc: &Document, score: f32) -> Self {
        Self {
            question: doc.question.clone(),
            answer: doc.answer.clone(),
            score,
            text: doc.text.clone(),
            source: doc.source.clone(),
        }
    }

    pub fn context_line(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// Grounding context assembled for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub question: String,
    pub contexts: Vec<String>,
    pub combined_context: String,
    pub top_score: f32,
}
