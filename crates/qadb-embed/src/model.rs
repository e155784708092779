use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{Device, DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use qadb_core::error::{Error, Result};
use qadb_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

const PAD_TOKEN_ID: u32 = 1;

fn encoding_err(e: candle_core::Error) -> Error { Error::Encoding(e.to_string()) }

/// Sentence encoder over a local XLM-RoBERTa checkpoint with mean pooling.
pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
    batch_size: usize,
}

impl EmbeddingModel {
    /// Load tokenizer, config, and weights from `model_dir`.
    ///
    /// Weights are read from `model.safetensors` when present, otherwise from
    /// `pytorch_model.bin`.
    pub fn load(model_dir: &Path, max_len: usize, batch_size: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::Encoding(format!("Failed to load tokenizer from {}: {e}", tokenizer_path.display()))
        })?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| Error::io(&config_path, e))?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Parse { path: config_path.clone(), reason: e.to_string() })?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb).map_err(encoding_err)?;

        let id = model_dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "xlm-roberta".to_string());
        info!(model = %id, dim = config.hidden_size, "embedding model loaded");
        Ok(Self {
            model,
            tokenizer,
            device,
            id,
            dim: config.hidden_size,
            max_len: max_len.max(1),
            batch_size: batch_size.max(1),
        })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, texts, self.max_len, PAD_TOKEN_ID, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(encoding_err)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(encoding_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask).map_err(encoding_err)?;
        let rows: Vec<Vec<f32>> = pooled
            .to_dtype(DType::F32)
            .and_then(|t| t.to_device(&Device::Cpu))
            .and_then(|t| t.to_vec2())
            .map_err(encoding_err)?;
        if let Some(row) = rows.iter().find(|r| r.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: row.len() });
        }
        Ok(rows)
    }
}

impl Embedder for EmbeddingModel {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.embed_chunk(chunk)?);
        }
        let elapsed = start.elapsed();
        debug!(texts = texts.len(), elapsed_ms = elapsed.as_millis() as u64, "embedded batch");
        if texts.len() == 1 && elapsed.as_millis() > 500 {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "slow query embedding");
        }
        Ok(out)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!(file = %safetensors.display(), "reading safetensors weights");
        return candle_core::safetensors::load(&safetensors, device).map_err(encoding_err);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        debug!(file = %pickle.display(), "reading pytorch weights");
        let tensors = candle_core::pickle::read_all(&pickle).map_err(encoding_err)?;
        return Ok(tensors.into_iter().collect());
    }
    Err(Error::NotFound(format!(
        "no model.safetensors or pytorch_model.bin in {}",
        model_dir.display()
    )))
}
