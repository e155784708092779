use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use qadb_core::error::Result;
use qadb_core::traits::Embedder;

const NGRAM: usize = 3;

/// Deterministic hashing encoder for tests and offline runs.
///
/// Each whitespace token contributes its character trigrams (or itself when
/// shorter) to a signed hashed bag of features. Texts that share most of their
/// characters land close together even in scripts written without spaces.
#[derive(Debug, Clone)]
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("fake:trigram:d{dim}") }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let chars: Vec<char> = token.chars().collect();
            if chars.len() < NGRAM {
                self.add_feature(&mut v, &token);
                continue;
            }
            for window in chars.windows(NGRAM) {
                let gram: String = window.iter().collect();
                self.add_feature(&mut v, &gram);
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], feature: &str) {
        let mut hasher = XxHash64::with_seed(0);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
        v[idx] += sign;
    }
}

impl Embedder for FakeEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
