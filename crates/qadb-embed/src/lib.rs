//! Embedding Encoder: turns text into fixed-dimension vectors.
//!
//! [`EmbeddingModel`] runs a local XLM-RoBERTa checkpoint through candle;
//! [`FakeEmbedder`] is a hashing stand-in used by tests and by deployments
//! that set `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.use_fake = true`.

mod device;
mod fake;
mod model;
mod pool;
mod tokenize;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use qadb_core::config::EmbeddingConfig;
use qadb_core::error::{Error, Result};
use qadb_core::traits::Embedder;

pub use device::select_device;
pub use fake::FakeEmbedder;
pub use model::EmbeddingModel;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the encoder described by `config`.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if config.use_fake || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        info!(dim = config.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(config.fake_dim)));
    }
    let dir = resolve_model_dir(config)?;
    Ok(Arc::new(EmbeddingModel::load(&dir, config.max_len, config.batch_size)?))
}

/// Locate the checkpoint directory.
///
/// Order: `embedding.model_dir`, `APP_MODEL_DIR`, `MODEL_DIR`, then
/// `models/<model>` and `../models/<model>` relative to the working directory.
pub fn resolve_model_dir(config: &EmbeddingConfig) -> Result<PathBuf> {
    let mut candidates: Vec<(&str, PathBuf)> = Vec::new();
    if let Some(dir) = &config.model_dir { candidates.push(("embedding.model_dir", dir.clone())); }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { candidates.push(("APP_MODEL_DIR", PathBuf::from(dir))); }
    if let Ok(dir) = std::env::var("MODEL_DIR") { candidates.push(("MODEL_DIR", PathBuf::from(dir))); }
    candidates.push(("default", PathBuf::from("models").join(&config.model)));
    candidates.push(("default", PathBuf::from("../models").join(&config.model)));

    for (origin, path) in &candidates {
        if path.exists() {
            info!(origin, dir = %path.display(), "using model dir");
            return Ok(path.clone());
        }
    }
    let tried: Vec<String> = candidates.iter().map(|(_, p)| p.display().to_string()).collect();
    Err(Error::NotFound(format!("model directory for {} (tried {})", config.model, tried.join(", "))))
}
