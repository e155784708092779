use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use qadb_core::types::Metric;

/// Snapshot of the service for health checks and the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub documents: DocumentsStatus,
    pub encoder: EncoderStatus,
    pub generator: GeneratorStatus,
    pub metric: Metric,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsStatus {
    /// `uninitialized`, `ready` or `unavailable`.
    pub state: String,
    pub count: usize,
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EncoderStatus {
    Ready { id: String, dim: usize },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GeneratorStatus {
    Enabled { model: String, reachable: bool },
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub accept: f32,
    pub context: f32,
}
