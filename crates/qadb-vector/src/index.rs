use tracing::{debug, warn};

use qadb_core::error::{Error, Result};
use qadb_core::types::{Document, Metric};

/// Flat index: one row per document, position `i` maps to `documents[i]`.
///
/// Under [`Metric::InnerProduct`] rows and queries are L2-normalized so scores
/// are cosine similarities.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    documents: Vec<Document>,
    /// Row-major, `documents.len() * dim` values.
    data: Vec<f32>,
    dim: usize,
    metric: Metric,
}

impl VectorIndex {
    pub fn empty(metric: Metric) -> Self {
        Self { documents: Vec::new(), data: Vec::new(), dim: 0, metric }
    }

    /// Index precomputed embeddings. `vectors[i]` must embed `documents[i]` and
    /// every vector must share one dimension.
    pub fn from_vectors(documents: Vec<Document>, vectors: Vec<Vec<f32>>, metric: Metric) -> Result<Self> {
        if documents.len() != vectors.len() {
            return Err(Error::InvalidConfig(format!(
                "{} documents but {} vectors",
                documents.len(),
                vectors.len()
            )));
        }
        let Some(dim) = vectors.first().map(Vec::len) else {
            return Ok(Self::empty(metric));
        };
        Self::from_vectors_with_dim(documents, vectors, dim, metric)
    }

    pub(crate) fn from_vectors_with_dim(
        documents: Vec<Document>,
        vectors: Vec<Vec<f32>>,
        dim: usize,
        metric: Metric,
    ) -> Result<Self> {
        if dim == 0 && !documents.is_empty() {
            return Err(Error::InvalidConfig("embeddings must have at least one dimension".to_string()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
        }
        let mut data = Vec::with_capacity(vectors.len() * dim);
        for mut v in vectors {
            if metric.normalizes() {
                l2_normalize(&mut v);
            }
            data.extend(v);
        }
        debug!(rows = documents.len(), dim, %metric, "vector index ready");
        Ok(Self { documents, data, dim, metric })
    }

    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
    pub fn dim(&self) -> usize { self.dim }
    pub fn metric(&self) -> Metric { self.metric }
    pub fn document(&self, i: usize) -> Option<&Document> { self.documents.get(i) }
    pub fn documents(&self) -> &[Document] { &self.documents }

    /// Top `k` positions with scores, best first. Equal scores keep insertion
    /// order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }
        if query.len() != self.dim {
            warn!(expected = self.dim, actual = query.len(), "query dimension does not match index");
            return Vec::new();
        }

        let mut q = query.to_vec();
        if self.metric.normalizes() {
            l2_normalize(&mut q);
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, v)| (i, self.metric.score(&q, v)))
            .collect();
        scored.sort_by(|a, b| self.metric.better(a.1, b.1));
        scored.truncate(k);
        scored
    }
}

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
