use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use qadb_core::error::{Error, Result};
use qadb_core::traits::Embedder;
use qadb_core::types::{Document, Metric};

use crate::index::VectorIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    pub metric: Metric,
    pub batch_size: usize,
    /// Draw an `indicatif` bar on stderr while embedding.
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { metric: Metric::InnerProduct, batch_size: 32, show_progress: false }
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

impl VectorIndex {
    /// Embed every document's `text` and index the result.
    pub fn build(documents: Vec<Document>, embedder: &dyn Embedder, options: &BuildOptions) -> Result<Self> {
        if documents.is_empty() {
            info!("no documents to index");
            return Ok(Self::empty(options.metric));
        }
        let start = Instant::now();
        let pb = options.show_progress.then(|| progress_bar(documents.len()));
        let batch_size = options.batch_size.max(1);
        let mut vectors = Vec::with_capacity(documents.len());

        for batch in documents.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embedded = embedder.embed_batch(&texts)?;
            if embedded.len() != texts.len() {
                return Err(Error::Encoding(format!(
                    "encoder returned {} vectors for {} texts",
                    embedded.len(),
                    texts.len()
                )));
            }
            vectors.extend(embedded);
            if let Some(pb) = &pb {
                pb.set_position(vectors.len() as u64);
            }
        }
        if let Some(pb) = pb {
            pb.finish_with_message("indexed");
        }

        let index = Self::from_vectors_with_dim(documents, vectors, embedder.dim(), options.metric)?;
        info!(
            documents = index.len(),
            dim = index.dim(),
            encoder = embedder.id(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built vector index"
        );
        Ok(index)
    }
}
