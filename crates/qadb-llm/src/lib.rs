//! Generative Completion Client.
//!
//! Talks to a local Ollama server, wraps the question and retrieved context in
//! a Thai prompt, and cleans the raw completion before it is shown.

pub mod backend;
pub mod generator;
pub mod prompt;

pub use backend::{CompletionBackend, OllamaBackend};
pub use generator::{clean_generated, CleanOptions, Completion, Generator};
pub use prompt::{PromptTemplate, ANSWER_MARKER};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Short machine-readable tag used in logs and degraded answers.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Network(_) => "network",
            LlmError::Timeout => "timeout",
            LlmError::Status { .. } => "status",
            LlmError::InvalidResponse(_) => "invalid_response",
            LlmError::Configuration(_) => "configuration",
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
