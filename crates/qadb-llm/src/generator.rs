use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use qadb_core::config::LlmConfig;

use crate::backend::{CompletionBackend, OllamaBackend};
use crate::prompt::{PromptTemplate, ANSWER_MARKER};
use crate::LlmError;

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Generated(String),
    /// The backend could not be reached or answered badly. `message` is the
    /// fixed degraded-service text.
    TransportFailure { reason: String, message: String },
}

/// Post-processing rules for raw model output.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub min_answer_chars: usize,
    pub reject_markers: Vec<String>,
    pub non_answer: String,
}

impl From<&LlmConfig> for CleanOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            min_answer_chars: config.min_answer_chars,
            reject_markers: config.reject_markers.clone(),
            non_answer: config.non_answer.clone(),
        }
    }
}

/// Strip an echoed prompt, collapse stuttered words, and reject degenerate
/// output in favour of `options.non_answer`.
pub fn clean_generated(raw: &str, options: &CleanOptions) -> String {
    let answer = match raw.rfind(ANSWER_MARKER) {
        Some(pos) => &raw[pos + ANSWER_MARKER.len()..],
        None => raw,
    };

    let mut words: Vec<&str> = Vec::new();
    for word in answer.split_whitespace() {
        if words.last() != Some(&word) {
            words.push(word);
        }
    }
    let answer = words.join(" ");

    let lowered = answer.to_lowercase();
    let rejected = options
        .reject_markers
        .iter()
        .any(|m| !m.is_empty() && lowered.contains(&m.to_lowercase()));
    if answer.chars().count() < options.min_answer_chars || rejected {
        return options.non_answer.clone();
    }
    answer
}

/// Prompt building plus completion plus cleanup.
pub struct Generator {
    backend: Arc<dyn CompletionBackend>,
    template: PromptTemplate,
    clean: CleanOptions,
    unavailable_message: String,
}

impl Generator {
    pub fn new(backend: Arc<dyn CompletionBackend>, clean: CleanOptions, unavailable_message: impl Into<String>) -> Self {
        Self {
            backend,
            template: PromptTemplate::default(),
            clean,
            unavailable_message: unavailable_message.into(),
        }
    }

    /// Generator over an [`OllamaBackend`] built from `config`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let backend = OllamaBackend::new(config)?;
        Ok(Self::new(Arc::new(backend), CleanOptions::from(config), config.unavailable_message.clone()))
    }

    pub fn backend(&self) -> &dyn CompletionBackend {
        self.backend.as_ref()
    }

    pub async fn generate(&self, question: &str, context: Option<&str>) -> Completion {
        let prompt = self.template.render(question, context);
        let start = Instant::now();
        match self.backend.complete(&prompt).await {
            Ok(raw) => {
                let answer = clean_generated(&raw, &self.clean);
                info!(
                    model = self.backend.model_name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    answer_chars = answer.chars().count(),
                    "generated answer"
                );
                Completion::Generated(answer)
            }
            Err(e) => {
                warn!(model = self.backend.model_name(), reason = e.kind(), error = %e, "completion failed");
                Completion::TransportFailure {
                    reason: e.kind().to_string(),
                    message: self.unavailable_message.clone(),
                }
            }
        }
    }
}
